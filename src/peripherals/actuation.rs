use crate::event;
use crate::flight_control::ControlOutput;

/// Drives the control surfaces.
pub trait ActuationSink: Send + std::fmt::Debug {
    /// Commands the surfaces, `output` is already clamped and reversed as configured.
    fn actuate(&mut self, output: ControlOutput);

    /// Centres the surfaces and lets go of them.
    fn release(&mut self);
}

/// Actuator without hardware, logging every command as an event.
#[derive(Debug, Clone, Default)]
pub struct LoggingActuator {
    last: Option<ControlOutput>,
    commands: u64,
}

impl LoggingActuator {
    /// The last command, `None` before the first one and after a release.
    pub fn last(&self) -> Option<ControlOutput> { self.last }

    pub fn commands(&self) -> u64 { self.commands }
}

impl ActuationSink for LoggingActuator {
    fn actuate(&mut self, output: ControlOutput) {
        event!("Surfaces: aileron {:+.3}, elevator {:+.3}", output.aileron, output.elevator);
        self.last = Some(output);
        self.commands += 1;
    }

    fn release(&mut self) {
        event!("Surfaces released after {} commands", self.commands);
        self.last = None;
    }
}
