use super::{
    axis_pid::{ControlAxis, PidTerm},
    controls::{ControlOutput, HeldAttitude, StickInputs, TrimState},
    horizon_history::HorizonHistory,
    program::{CycleInputs, FlightProgram},
    program_id::ProgramId,
};
use crate::common::geometry::signed_roll;
use crate::config::{ControllerConfig, PidGains, secs_to_cycles};
use crate::horizon::AttitudeSample;
use crate::{log, prog, warn};
use std::fmt;

/// An explicit program request the transition table does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRejected {
    pub from: ProgramId,
    pub to: ProgramId,
}

impl fmt::Display for TransitionRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "switching from {} to {} is not allowed", self.from, self.to)
    }
}

impl std::error::Error for TransitionRejected {}

/// What happened in one controller cycle, for actuation and recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    /// The program that produced `output`.
    pub program: ProgramId,
    pub output: ControlOutput,
    pub sticks: StickInputs,
    pub trims: TrimState,
}

/// Runs exactly one flight program per cycle and owns the state shared between programs.
///
/// # Fields
/// - `config`: Controller configuration, including the live PID gains.
/// - `fps`: Control loop rate.
/// - `program`: The active program and its private state.
/// - `history`: Horizon quality of the recent cycles.
/// - `held`: The attitude handed to the programs.
/// - `trims`: Current trims.
#[derive(Debug, Clone)]
pub struct FlightController {
    config: ControllerConfig,
    fps: u32,
    program: FlightProgram,
    history: HorizonHistory,
    held: HeldAttitude,
    trims: TrimState,
}

impl FlightController {
    pub fn new(config: ControllerConfig, fps: u32) -> Self {
        let history = HorizonHistory::new(secs_to_cycles(config.horizon_memory_secs, fps));
        let program = FlightProgram::new(ProgramId::Manual, &config, fps);
        Self { config, fps, program, history, held: HeldAttitude::default(), trims: TrimState::default() }
    }

    pub fn active_program(&self) -> ProgramId { self.program.id() }

    pub fn trims(&self) -> TrimState { self.trims }

    pub fn held_attitude(&self) -> HeldAttitude { self.held }

    pub fn config(&self) -> &ControllerConfig { &self.config }

    /// Runs one control cycle.
    ///
    /// # Arguments
    /// * `attitude` - The detector result of this cycle.
    /// * `sticks` - Stick positions sampled at the start of the cycle.
    ///
    /// # Returns
    /// The clamped (and, if configured, reversed) command together with the inputs it was
    /// computed from. A program change caused by this cycle only takes effect in the next one.
    pub fn run(&mut self, attitude: &AttitudeSample, sticks: StickInputs) -> CycleReport {
        self.history.push(attitude.is_good);
        self.update_held_attitude(attitude);

        let program = self.program.id();
        let inputs = CycleInputs { attitude: self.held, sticks, history: &self.history };
        let step = self.program.step(&inputs, &mut self.trims);

        if self.program.is_interruptable() && self.trims.is_exceeded_by(&sticks, self.config.interrupt_threshold) {
            warn!(
                "Pilot input (aileron {:.2}, elevator {:.2}) interrupts {program}",
                sticks.aileron, sticks.elevator
            );
            self.switch_to(ProgramId::Manual);
        } else if step.is_finished {
            prog!("{program} finished");
            self.switch_to(ProgramId::Manual);
        }

        let mut output = step.output.clamped(self.config.max_deflection);
        if self.config.servos_reversed {
            output = output.reversed();
        }
        CycleReport { program, output, sticks, trims: self.trims }
    }

    /// Follows a good horizon, coasts on the last one while the history still has a good entry
    /// and falls back to neutral once it has none.
    fn update_held_attitude(&mut self, attitude: &AttitudeSample) {
        if let Some((roll, pitch)) = attitude.good_attitude() {
            self.held = HeldAttitude { roll_deg: signed_roll(roll), pitch_deg: pitch, is_good: true };
        } else if self.history.any_good() {
            self.held.is_good = false;
        } else {
            self.held = HeldAttitude::default();
        }
    }

    /// Switches to `id` on request, with fresh program state.
    ///
    /// # Returns
    /// - `Err(TransitionRejected)` if the transition table forbids the switch, the active
    ///   program keeps running untouched.
    pub fn select_program(&mut self, id: ProgramId) -> Result<(), TransitionRejected> {
        let from = self.program.id();
        if !from.may_switch_to(id) {
            return Err(TransitionRejected { from, to: id });
        }
        self.switch_to(id);
        Ok(())
    }

    fn switch_to(&mut self, id: ProgramId) {
        prog!("Starting program {id}");
        self.program = FlightProgram::new(id, &self.config, self.fps);
    }

    /// Changes one PID gain of `axis` by `delta`.
    ///
    /// The new gains apply to the next autopilot activation and, if the autopilot is
    /// flying, immediately.
    pub fn adjust_gain(&mut self, axis: ControlAxis, term: PidTerm, delta: f64) -> PidGains {
        let gains = match axis {
            ControlAxis::Aileron => &mut self.config.aileron_pid,
            ControlAxis::Elevator => &mut self.config.elevator_pid,
        };
        *gains = gains.adjusted(term, delta);
        let gains = *gains;
        if let FlightProgram::LevelFlight(level_flight) = &mut self.program {
            level_flight.set_gains(axis, gains);
        }
        log!("{axis} gains now p {:.4}, i {:.4}, d {:.4}", gains.kp, gains.ki, gains.kd);
        gains
    }

    /// The gains of the running autopilot, `None` if it is not active.
    pub fn active_gains(&self, axis: ControlAxis) -> Option<PidGains> {
        match &self.program {
            FlightProgram::LevelFlight(level_flight) => Some(level_flight.gains(axis)),
            _ => None,
        }
    }
}
