use strum_macros::Display;

/// A position change of one of the receiver switches.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum SwitchEvent {
    RecordingOn,
    RecordingOff,
    AutopilotOn,
    AutopilotOff,
}

/// Why the control loop stopped.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum LoopExitSignal {
    /// The frame source has no more frames.
    EndOfStream,
    /// Shutdown was requested.
    Shutdown,
}
