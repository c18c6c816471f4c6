//! The periodic sense, decide and act loop around the detector and the controller.

mod cycle_timer;
mod loop_context;
mod pilot_loop;
mod signal;
mod switch_monitor;

pub use cycle_timer::CycleTimer;
pub use loop_context::LoopContext;
pub use pilot_loop::PilotLoop;
pub use signal::{LoopExitSignal, SwitchEvent};
pub use switch_monitor::{SwitchMonitor, SwitchTracker};
