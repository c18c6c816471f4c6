use crate::flight_control::StickInputs;

/// One read of the radio receiver.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReceiverSnapshot {
    pub sticks: StickInputs,
    pub recording_switch: bool,
    pub autopilot_switch: bool,
}

impl ReceiverSnapshot {
    pub fn switches(&self) -> (bool, bool) { (self.recording_switch, self.autopilot_switch) }
}

/// Source of pilot commands.
///
/// Reads must not block for longer than a fraction of a control cycle.
pub trait StickReceiver: Send + std::fmt::Debug {
    fn sample(&mut self) -> ReceiverSnapshot;
}

/// Receiver stand-in reporting centred sticks and both switches off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralReceiver;

impl StickReceiver for NeutralReceiver {
    fn sample(&mut self) -> ReceiverSnapshot { ReceiverSnapshot::default() }
}
