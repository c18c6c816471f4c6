//! YAML configuration of the pilot.
//!
//! Every section falls back to its defaults field by field, so a partial file only needs
//! to name the values it changes.

use crate::horizon::SkyFilter;
use crate::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;
use strum_macros::Display;

/// Environment variable holding the configuration path.
pub const CONFIG_PATH_ENV: &str = "HORIZON_PILOT_CONFIG";
/// Configuration path used if [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "configurations.yaml";
/// Environment variable selecting a directory of still images as frame source.
pub const FRAME_DIR_ENV: &str = "HORIZON_FRAME_DIR";

#[derive(Debug, Display)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_yaml::Error),
    Invalid(String),
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self { Self { width, height } }

    pub fn aspect_ratio(&self) -> f64 { f64::from(self.width) / f64::from(self.height) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f64,
    pub resolution: Resolution,
    pub inference_resolution: Resolution,
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 48.8,
            resolution: Resolution::new(640, 480),
            inference_resolution: Resolution::new(100, 100),
            fps: 30,
        }
    }
}

impl CameraConfig {
    /// Duration of one control cycle in seconds.
    pub fn cycle_secs(&self) -> f64 { 1.0 / f64::from(self.fps) }

    /// Converts a duration in seconds into a whole number of control cycles.
    pub fn cycles(&self, secs: f64) -> usize { secs_to_cycles(secs, self.fps) }
}

/// Number of control cycles closest to `secs` at a loop rate of `fps`, never negative.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn secs_to_cycles(secs: f64, fps: u32) -> usize { (secs * f64::from(fps)).round().max(0.0) as usize }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Maximum mean residual of a good horizon in percent of the frame height.
    pub acceptable_variance: f64,
    /// Maximum distance of a point to the predicted horizon, in degrees of pitch.
    pub exclusion_thresh: f64,
    pub min_points: usize,
    pub max_sample_points: usize,
    /// Side length of an edge grid block in pixels.
    pub pooling_block: u32,
    /// Sobel magnitude above which a pixel counts as an edge.
    pub edge_threshold: u16,
    /// Sigma of the Gaussian applied before binarization, `0` disables smoothing.
    pub smoothing_sigma: f32,
    pub sky: SkyFilter,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            acceptable_variance: 1.3,
            exclusion_thresh: 4.0,
            min_points: 12,
            max_sample_points: 80,
            pooling_block: 5,
            edge_threshold: 100,
            smoothing_sigma: 1.0,
            sky: SkyFilter::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Symmetric limit of the PID output.
    pub output_limit: f64,
}

impl PidGains {
    pub const fn proportional(kp: f64, output_limit: f64) -> Self { Self { kp, ki: 0.0, kd: 0.0, output_limit } }
}

impl Default for PidGains {
    fn default() -> Self { Self::proportional(0.0, ControllerConfig::DEFAULT_MAX_DEFLECTION) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub max_deflection: f64,
    pub interrupt_threshold: f64,
    pub horizon_memory_secs: f64,
    pub servos_reversed: bool,
    pub aileron_pid: PidGains,
    pub elevator_pid: PidGains,
    pub trim_secs: f64,
    pub easy_mode_limit_roll: f64,
    pub easy_mode_limit_pitch: f64,
    pub easy_mode_active_zone: f64,
    pub surface_check_reversals: u32,
    /// Surface check sweep speed in deflection units per second.
    pub surface_check_rate: f64,
    pub wiggle_deflection: f64,
    pub wiggle_secs: f64,
}

impl ControllerConfig {
    const DEFAULT_MAX_DEFLECTION: f64 = 0.4;
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_deflection: Self::DEFAULT_MAX_DEFLECTION,
            interrupt_threshold: 0.25,
            horizon_memory_secs: 0.25,
            servos_reversed: false,
            aileron_pid: PidGains::proportional(0.015, Self::DEFAULT_MAX_DEFLECTION),
            elevator_pid: PidGains::proportional(0.0375, Self::DEFAULT_MAX_DEFLECTION),
            trim_secs: 1.0,
            easy_mode_limit_roll: 30.0,
            easy_mode_limit_pitch: 10.0,
            easy_mode_active_zone: 0.5,
            surface_check_reversals: 7,
            surface_check_rate: 3.0,
            wiggle_deflection: 0.1,
            wiggle_secs: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub directory: String,
    pub queue_capacity: usize,
}

impl Default for RecordingConfig {
    fn default() -> Self { Self { directory: "recordings".to_string(), queue_capacity: 64 } }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PilotConfig {
    pub camera: CameraConfig,
    pub detector: DetectorConfig,
    pub controller: ControllerConfig,
    pub recording: RecordingConfig,
}

impl PilotConfig {
    const FALLBACK_INFERENCE_RESOLUTION: Resolution = Resolution::new(100, 100);
    /// Smallest surface check movement per cycle, as a fraction of full deflection.
    const MIN_SURFACE_CHECK_INCREMENT: f64 = 1e-3;

    /// Loads the configuration from the path named by [`CONFIG_PATH_ENV`].
    ///
    /// A missing file yields the defaults, an unreadable or malformed one is an error.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let path = Path::new(&path);
        if !path.exists() {
            warn!("No configuration at {}, using defaults", path.display());
            return Self::default().validated();
        }
        Self::load(path)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_yaml(&yaml)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(ConfigError::Parse)?;
        config.validated()
    }

    /// Rejects values the control loop cannot run with and repairs the inference resolution.
    ///
    /// An inference resolution taller than the camera is replaced by 100x100, one with a wider
    /// aspect ratio than the camera is narrowed to the camera aspect ratio.
    #[allow(clippy::cast_possible_truncation)]
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        let camera = &mut self.camera;
        if camera.fps == 0 {
            return Err(ConfigError::Invalid("camera.fps must be positive".into()));
        }
        if !(camera.fov > 0.0 && camera.fov < 180.0) {
            return Err(ConfigError::Invalid(format!("camera.fov {} is not in (0, 180)", camera.fov)));
        }
        if camera.resolution.width == 0 || camera.resolution.height == 0 {
            return Err(ConfigError::Invalid("camera.resolution must not be empty".into()));
        }
        if camera.inference_resolution.width == 0 || camera.inference_resolution.height == 0 {
            return Err(ConfigError::Invalid("camera.inference_resolution must not be empty".into()));
        }
        if camera.inference_resolution.height > camera.resolution.height {
            warn!(
                "Inference resolution {}x{} is taller than the camera, using {}x{}",
                camera.inference_resolution.width,
                camera.inference_resolution.height,
                Self::FALLBACK_INFERENCE_RESOLUTION.width,
                Self::FALLBACK_INFERENCE_RESOLUTION.height
            );
            camera.inference_resolution = Self::FALLBACK_INFERENCE_RESOLUTION;
        }
        if camera.inference_resolution.aspect_ratio() > camera.resolution.aspect_ratio() {
            let height = camera.inference_resolution.height;
            let width = (u64::from(height) * u64::from(camera.resolution.width) / u64::from(camera.resolution.height)) as u32;
            warn!(
                "Inference aspect ratio is wider than the camera, narrowing {}x{height} to {width}x{height}",
                camera.inference_resolution.width
            );
            camera.inference_resolution.width = width.max(1);
        }

        let controller = &self.controller;
        if !(controller.max_deflection > 0.0 && controller.max_deflection <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "controller.max_deflection {} is not in (0, 1]",
                controller.max_deflection
            )));
        }
        for (name, gains) in [("aileron_pid", controller.aileron_pid), ("elevator_pid", controller.elevator_pid)] {
            if gains.output_limit.is_nan() || gains.output_limit < 0.0 {
                return Err(ConfigError::Invalid(format!("controller.{name}.output_limit must not be negative")));
            }
        }
        if controller.easy_mode_active_zone <= 0.0 {
            return Err(ConfigError::Invalid("controller.easy_mode_active_zone must be positive".into()));
        }
        let increment = controller.surface_check_rate / f64::from(self.camera.fps);
        if increment.is_nan() || increment < Self::MIN_SURFACE_CHECK_INCREMENT {
            return Err(ConfigError::Invalid(format!(
                "controller.surface_check_rate {} is below {} per cycle at {} fps",
                controller.surface_check_rate,
                Self::MIN_SURFACE_CHECK_INCREMENT,
                self.camera.fps
            )));
        }
        if self.detector.pooling_block == 0 {
            return Err(ConfigError::Invalid("detector.pooling_block must be positive".into()));
        }
        if self.recording.queue_capacity == 0 {
            return Err(ConfigError::Invalid("recording.queue_capacity must be positive".into()));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "camera:\n  fps: 20\ncontroller:\n  aileron_pid:\n    kp: 0.02\n";
        let config = PilotConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.camera.fps, 20);
        assert!((config.camera.fov - 48.8).abs() < 1e-12);
        assert!((config.controller.aileron_pid.kp - 0.02).abs() < 1e-12);
        assert!((config.controller.aileron_pid.output_limit - 0.4).abs() < 1e-12);
        assert!((config.controller.elevator_pid.kp - 0.0375).abs() < 1e-12);
        assert_eq!(config.detector, DetectorConfig::default());
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        assert!(matches!(PilotConfig::from_yaml("camera: [1, 2"), Err(ConfigError::Parse(_))));
        assert!(matches!(PilotConfig::from_yaml("camera:\n  fps: 0\n"), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_inference_resolution_is_repaired() {
        let tall = "camera:\n  inference_resolution: { width: 100, height: 600 }\n";
        let config = PilotConfig::from_yaml(tall).unwrap();
        assert_eq!(config.camera.inference_resolution, Resolution::new(100, 100));

        let wide = "camera:\n  inference_resolution: { width: 300, height: 120 }\n";
        let config = PilotConfig::from_yaml(wide).unwrap();
        assert_eq!(config.camera.inference_resolution, Resolution::new(160, 120));
    }

    #[test]
    fn test_surface_check_rate_needs_a_usable_increment() {
        let crawling = "controller:\n  surface_check_rate: 1.0e-9\n";
        assert!(matches!(PilotConfig::from_yaml(crawling), Err(ConfigError::Invalid(_))));
        let negative = "controller:\n  surface_check_rate: -3.0\n";
        assert!(matches!(PilotConfig::from_yaml(negative), Err(ConfigError::Invalid(_))));

        let slow = "camera:\n  fps: 30\ncontroller:\n  surface_check_rate: 0.3\n";
        assert!(PilotConfig::from_yaml(slow).is_ok());
    }

    #[test]
    fn test_cycles_from_seconds() {
        let camera = CameraConfig::default();
        assert_eq!(camera.cycles(0.25), 8);
        assert_eq!(camera.cycles(1.0), 30);
        assert_eq!(camera.cycles(-1.0), 0);
    }
}
