use crate::config::PidGains;
use pid::Pid;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// A control surface axis driven by the autopilot.
#[derive(Debug, Display, EnumIter, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlAxis {
    Aileron,
    Elevator,
}

/// One term of a PID controller.
#[derive(Debug, Display, EnumIter, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PidTerm {
    P,
    I,
    D,
}

impl PidGains {
    /// Copy of these gains with `term` changed by `delta`.
    pub fn adjusted(mut self, term: PidTerm, delta: f64) -> Self {
        match term {
            PidTerm::P => self.kp += delta,
            PidTerm::I => self.ki += delta,
            PidTerm::D => self.kd += delta,
        }
        self
    }
}

/// PID loop of a single axis, stepped once per control cycle.
///
/// Gains are configured per second. The underlying controller works per step, so the
/// integral gain is scaled by the cycle period and the derivative gain divided by it.
#[derive(Clone)]
pub struct AxisPid {
    pid: Pid<f64>,
    gains: PidGains,
    cycle_secs: f64,
}

impl AxisPid {
    pub fn new(gains: PidGains, cycle_secs: f64) -> Self {
        let mut axis = Self { pid: Pid::new(0.0, gains.output_limit), gains, cycle_secs };
        axis.apply_gains();
        axis
    }

    fn apply_gains(&mut self) {
        let limit = self.gains.output_limit;
        self.pid.output_limit = limit;
        self.pid
            .p(self.gains.kp, limit)
            .i(self.gains.ki * self.cycle_secs, limit)
            .d(self.gains.kd / self.cycle_secs, limit);
    }

    pub fn gains(&self) -> PidGains { self.gains }

    /// Replaces the gains, keeping the accumulated integral and derivative history.
    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
        self.apply_gains();
    }

    /// Advances the loop by one cycle.
    ///
    /// # Arguments
    /// * `setpoint` - Desired value of the controlled quantity.
    /// * `measurement` - Current value of the controlled quantity.
    ///
    /// # Returns
    /// The control output, limited to the configured output limit.
    pub fn step(&mut self, setpoint: f64, measurement: f64) -> f64 {
        self.pid.setpoint(setpoint);
        self.pid.next_control_output(measurement).output
    }
}

impl std::fmt::Debug for AxisPid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AxisPid").field("gains", &self.gains).field("setpoint", &self.pid.setpoint).finish()
    }
}
