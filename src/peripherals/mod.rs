//! Boundaries to the radio receiver and the control surface servos.

mod actuation;
mod receiver;

pub use actuation::{ActuationSink, LoggingActuator};
pub use receiver::{NeutralReceiver, ReceiverSnapshot, StickReceiver};
