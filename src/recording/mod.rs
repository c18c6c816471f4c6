//! Per cycle diagnostics persisted off the control path.

mod cycle_record;
mod recorder;

pub use cycle_record::{CycleRecord, RecordingMetadata};
pub use recorder::{DiagnosticsRecorder, RecorderError};
