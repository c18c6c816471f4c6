use super::{CycleInputs, ProgramStep};
use crate::flight_control::controls::{ControlOutput, FULL_DEFLECTION, TrimState, clamp_deflection};

/// The pilot flies: sticks plus trim are passed through.
#[derive(Debug, Clone, Copy, Default)]
pub struct Manual;

impl Manual {
    pub fn step(&self, inputs: &CycleInputs, trims: &TrimState) -> ProgramStep {
        let sticks = inputs.sticks;
        ProgramStep::running(ControlOutput::new(
            clamp_deflection(sticks.aileron + trims.aileron_trim, FULL_DEFLECTION),
            clamp_deflection(sticks.elevator + trims.elevator_trim, FULL_DEFLECTION),
        ))
    }
}
