//! The flight programs and the closed factory selecting them by [`ProgramId`].

mod level_flight;
mod manual;
mod quick_wiggle;
mod surface_check;

pub use level_flight::LevelFlight;
pub use manual::Manual;
pub use quick_wiggle::QuickWiggle;
pub use surface_check::SurfaceCheck;

use super::{
    controls::{ControlOutput, HeldAttitude, StickInputs, TrimState},
    horizon_history::HorizonHistory,
    program_id::ProgramId,
};
use crate::config::ControllerConfig;

/// Everything a program reads during one cycle.
#[derive(Debug, Clone, Copy)]
pub struct CycleInputs<'a> {
    pub attitude: HeldAttitude,
    pub sticks: StickInputs,
    pub history: &'a HorizonHistory,
}

/// Result of a single program step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgramStep {
    pub output: ControlOutput,
    pub is_finished: bool,
}

impl ProgramStep {
    pub const fn running(output: ControlOutput) -> Self { Self { output, is_finished: false } }

    pub const fn finished(output: ControlOutput) -> Self { Self { output, is_finished: true } }
}

/// The program currently flying the aircraft, together with its private state.
#[derive(Debug, Clone)]
pub enum FlightProgram {
    Manual(Manual),
    SurfaceCheck(SurfaceCheck),
    LevelFlight(LevelFlight),
    QuickWiggle(QuickWiggle),
}

impl FlightProgram {
    /// Creates the program `id` with fresh state.
    ///
    /// # Arguments
    /// * `id` - The program to create.
    /// * `config` - Controller configuration the program derives its parameters from.
    /// * `fps` - Control loop rate, programs count time in cycles.
    pub fn new(id: ProgramId, config: &ControllerConfig, fps: u32) -> Self {
        match id {
            ProgramId::Manual => FlightProgram::Manual(Manual),
            ProgramId::SurfaceCheck => FlightProgram::SurfaceCheck(SurfaceCheck::new(config, fps)),
            ProgramId::LevelFlight => FlightProgram::LevelFlight(LevelFlight::new(config, fps)),
            ProgramId::QuickWiggle => FlightProgram::QuickWiggle(QuickWiggle::new(config, fps)),
        }
    }

    pub fn id(&self) -> ProgramId {
        match self {
            FlightProgram::Manual(_) => ProgramId::Manual,
            FlightProgram::SurfaceCheck(_) => ProgramId::SurfaceCheck,
            FlightProgram::LevelFlight(_) => ProgramId::LevelFlight,
            FlightProgram::QuickWiggle(_) => ProgramId::QuickWiggle,
        }
    }

    pub fn is_interruptable(&self) -> bool { self.id().is_interruptable() }

    /// Runs one cycle of the program.
    ///
    /// `trims` is shared with the controller, programs acquiring a new trim write it back.
    pub fn step(&mut self, inputs: &CycleInputs, trims: &mut TrimState) -> ProgramStep {
        match self {
            FlightProgram::Manual(program) => program.step(inputs, trims),
            FlightProgram::SurfaceCheck(program) => program.step(),
            FlightProgram::LevelFlight(program) => program.step(inputs, trims),
            FlightProgram::QuickWiggle(program) => program.step(),
        }
    }
}
