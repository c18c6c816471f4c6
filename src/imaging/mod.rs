//! Frame acquisition and normalization ahead of the horizon detector.

mod crop_and_scale;
mod frame_source;

pub use crop_and_scale::{CropScaleParams, FrameNormalizer, crop_and_scale};
pub use frame_source::{
    FrameSource, FrameSourceError, ImageSequenceSource, SyntheticHorizonSource, spawn_frame_producer,
};
