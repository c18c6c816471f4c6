use crate::config::{PidGains, PilotConfig, Resolution};
use crate::flight_control::{ControlOutput, CycleReport, ProgramId, StickInputs, TrimState};
use crate::horizon::AttitudeSample;
use serde::{Deserialize, Serialize};

/// Everything the pilot knew and did in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub roll: Option<f64>,
    pub pitch: Option<f64>,
    pub variance: Option<f64>,
    pub is_good: bool,
    pub control_output: ControlOutput,
    pub active_program: ProgramId,
    pub stick_inputs: StickInputs,
    pub trims: TrimState,
}

impl CycleRecord {
    pub fn new(attitude: &AttitudeSample, report: &CycleReport) -> Self {
        Self {
            roll: attitude.roll_deg,
            pitch: attitude.pitch_deg,
            variance: attitude.variance,
            is_good: attitude.is_good,
            control_output: report.output,
            active_program: report.program,
            stick_inputs: report.sticks,
            trims: report.trims,
        }
    }
}

/// Configuration snapshot written ahead of the records of a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub started: chrono::DateTime<chrono::Utc>,
    pub fov: f64,
    pub fps: u32,
    pub resolution: Resolution,
    pub inference_resolution: Resolution,
    pub acceptable_variance: f64,
    pub exclusion_thresh: f64,
    pub max_deflection: f64,
    pub servos_reversed: bool,
    pub interrupt_threshold: f64,
    pub aileron_pid: PidGains,
    pub elevator_pid: PidGains,
}

impl RecordingMetadata {
    /// Snapshot of `config`; `controller_gains` are the live gains, which may differ from the
    /// loaded ones after tuning.
    pub fn new(config: &PilotConfig, controller_gains: (PidGains, PidGains)) -> Self {
        Self {
            started: chrono::Utc::now(),
            fov: config.camera.fov,
            fps: config.camera.fps,
            resolution: config.camera.resolution,
            inference_resolution: config.camera.inference_resolution,
            acceptable_variance: config.detector.acceptable_variance,
            exclusion_thresh: config.detector.exclusion_thresh,
            max_deflection: config.controller.max_deflection,
            servos_reversed: config.controller.servos_reversed,
            interrupt_threshold: config.controller.interrupt_threshold,
            aileron_pid: controller_gains.0,
            elevator_pid: controller_gains.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_exactly_the_cycle_fields() {
        let attitude = AttitudeSample::fitted(12.5, -3.0, 0.4, 1.3);
        let report = CycleReport {
            program: ProgramId::LevelFlight,
            output: ControlOutput::new(0.1, -0.2),
            sticks: StickInputs::new(0.05, 0.0, 0.3),
            trims: TrimState::new(0.01, -0.02),
        };
        let value = serde_json::to_value(CycleRecord::new(&attitude, &report)).unwrap();
        let object = value.as_object().unwrap();
        let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            ["active_program", "control_output", "is_good", "pitch", "roll", "stick_inputs", "trims", "variance"]
        );
        assert_eq!(object["active_program"], "level_flight");
        assert_eq!(object["roll"], 12.5);
        assert!(object["is_good"].as_bool().unwrap());
    }

    #[test]
    fn test_missing_horizon_is_null() {
        let report = CycleReport {
            program: ProgramId::Manual,
            output: ControlOutput::NEUTRAL,
            sticks: StickInputs::CENTRED,
            trims: TrimState::default(),
        };
        let value = serde_json::to_value(CycleRecord::new(&AttitudeSample::NO_HORIZON, &report)).unwrap();
        assert!(value["roll"].is_null() && value["pitch"].is_null() && value["variance"].is_null());
    }
}
