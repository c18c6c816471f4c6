//! Attitude estimation from the position of the horizon in a camera frame.

mod attitude;
mod diagnostics;
mod edge_grid;
mod horizon_detector;
mod prediction;
mod sky_filter;

pub use attitude::AttitudeSample;
pub use horizon_detector::HorizonDetector;
pub use prediction::{PredictedHorizon, PredictionState};
pub use sky_filter::SkyFilter;
