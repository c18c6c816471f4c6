use super::{CycleInputs, ProgramStep};
use crate::config::{ControllerConfig, PidGains, secs_to_cycles};
use crate::flight_control::{
    axis_pid::{AxisPid, ControlAxis},
    controls::{ControlOutput, StickInputs, TrimState},
};
use crate::prog;

/// Autopilot keeping the wings level and the nose on the horizon.
///
/// Roll drives the ailerons and pitch the elevator, each through its own PID loop. The stick
/// offsets the targets ("easy mode"), so the pilot can bank or climb gently without taking
/// over. While the horizon is briefly lost the last command is held, once it is lost for the
/// whole history window both surfaces return to neutral. Trim is added last and not clamped
/// again.
#[derive(Debug, Clone)]
pub struct LevelFlight {
    roll_pid: AxisPid,
    pitch_pid: AxisPid,
    easy_mode: EasyMode,
    trim: TrimAcquisition,
    command: ControlOutput,
}

impl LevelFlight {
    pub fn new(config: &ControllerConfig, fps: u32) -> Self {
        let cycle_secs = 1.0 / f64::from(fps);
        Self {
            roll_pid: AxisPid::new(config.aileron_pid, cycle_secs),
            pitch_pid: AxisPid::new(config.elevator_pid, cycle_secs),
            easy_mode: EasyMode {
                limit_roll: config.easy_mode_limit_roll,
                limit_pitch: config.easy_mode_limit_pitch,
                active_zone: config.easy_mode_active_zone,
            },
            trim: TrimAcquisition::new(secs_to_cycles(config.trim_secs, fps)),
            command: ControlOutput::NEUTRAL,
        }
    }

    /// Pushes new gains into the running loop of `axis`.
    pub fn set_gains(&mut self, axis: ControlAxis, gains: PidGains) {
        match axis {
            ControlAxis::Aileron => self.roll_pid.set_gains(gains),
            ControlAxis::Elevator => self.pitch_pid.set_gains(gains),
        }
    }

    pub fn gains(&self, axis: ControlAxis) -> PidGains {
        match axis {
            ControlAxis::Aileron => self.roll_pid.gains(),
            ControlAxis::Elevator => self.pitch_pid.gains(),
        }
    }

    pub fn step(&mut self, inputs: &CycleInputs, trims: &mut TrimState) -> ProgramStep {
        if let Some(acquired) = self.trim.add(&inputs.sticks) {
            *trims = acquired;
            prog!("Trim acquired: aileron {:.3}, elevator {:.3}", acquired.aileron_trim, acquired.elevator_trim);
        }

        let attitude = inputs.attitude;
        let roll_target = self.easy_mode.target(inputs.sticks.aileron, self.easy_mode.limit_roll);
        let pitch_target = self.easy_mode.target(inputs.sticks.elevator, self.easy_mode.limit_pitch);
        // both loops advance every cycle, a bad horizon only discards their output
        let aileron = self.roll_pid.step(roll_target, attitude.roll_deg);
        let elevator = self.pitch_pid.step(pitch_target, attitude.pitch_deg);
        if attitude.is_good {
            self.command = ControlOutput::new(aileron, elevator);
        }
        if !inputs.history.any_good() {
            self.command = ControlOutput::NEUTRAL;
        }
        ProgramStep::running(self.command.trimmed(trims))
    }
}

/// Maps stick deflection onto attitude targets.
#[derive(Debug, Clone, Copy)]
struct EasyMode {
    limit_roll: f64,
    limit_pitch: f64,
    active_zone: f64,
}

impl EasyMode {
    /// `limit * clamp(stick, ±zone) / zone`: full `limit` at the edge of the active zone.
    fn target(&self, stick: f64, limit: f64) -> f64 {
        limit * stick.clamp(-self.active_zone, self.active_zone) / self.active_zone
    }
}

/// Averages the first stick samples after activation into new trims.
#[derive(Debug, Clone)]
struct TrimAcquisition {
    target: usize,
    samples: usize,
    aileron_sum: f64,
    elevator_sum: f64,
}

impl TrimAcquisition {
    fn new(target: usize) -> Self { Self { target, samples: 0, aileron_sum: 0.0, elevator_sum: 0.0 } }

    fn is_done(&self) -> bool { self.samples >= self.target }

    /// Adds a sample, returning the trims once the last one arrived.
    #[allow(clippy::cast_precision_loss)]
    fn add(&mut self, sticks: &StickInputs) -> Option<TrimState> {
        if self.is_done() {
            return None;
        }
        self.aileron_sum += sticks.aileron;
        self.elevator_sum += sticks.elevator;
        self.samples += 1;
        self.is_done().then(|| {
            let n = self.samples as f64;
            TrimState::new(self.aileron_sum / n, self.elevator_sum / n)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easy_mode_targets() {
        let easy = EasyMode { limit_roll: 30.0, limit_pitch: 10.0, active_zone: 0.5 };
        assert!((easy.target(0.25, easy.limit_roll) - 15.0).abs() < 1e-12);
        assert!((easy.target(-0.9, easy.limit_roll) + 30.0).abs() < 1e-12);
        assert!((easy.target(0.5, easy.limit_pitch) - 10.0).abs() < 1e-12);
        assert!(easy.target(0.0, easy.limit_pitch).abs() < 1e-12);
    }

    #[test]
    fn test_trim_acquisition_averages_first_samples() {
        let mut acquisition = TrimAcquisition::new(3);
        assert!(acquisition.add(&StickInputs::new(0.1, -0.2, 0.0)).is_none());
        assert!(acquisition.add(&StickInputs::new(0.2, -0.1, 0.0)).is_none());
        let trims = acquisition.add(&StickInputs::new(0.3, 0.0, 0.0)).unwrap();
        assert!((trims.aileron_trim - 0.2).abs() < 1e-12);
        assert!((trims.elevator_trim + 0.1).abs() < 1e-12);
        assert!(acquisition.add(&StickInputs::new(1.0, 1.0, 0.0)).is_none());
        assert!(acquisition.is_done());
    }

    #[test]
    fn test_disabled_trim_acquisition() {
        let mut acquisition = TrimAcquisition::new(0);
        assert!(acquisition.is_done());
        assert!(acquisition.add(&StickInputs::new(0.3, 0.3, 0.0)).is_none());
    }
}
