//! The flight controller state machine and the flight programs it runs.

pub(crate) mod axis_pid;
pub(crate) mod controls;
mod flight_controller;
mod horizon_history;
pub(crate) mod program;
mod program_id;
#[cfg(test)]
mod tests;

pub use axis_pid::{ControlAxis, PidTerm};
pub use controls::{ControlOutput, StickInputs, TrimState};
pub use flight_controller::{CycleReport, FlightController, TransitionRejected};
pub use program_id::ProgramId;
