use super::signal::SwitchEvent;
use crate::peripherals::{ReceiverSnapshot, StickReceiver};
use std::time::Duration;
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Polls the receiver on its own task and publishes the latest snapshot.
///
/// The control loop reads the snapshot once at the start of each cycle, so a slow receiver
/// never stalls a cycle.
///
/// # Fields
/// - `c_tok`: Stops the polling task, a child of the token passed to `start`.
/// - `handle`: The polling task, handing the receiver back when it stops.
/// - `snapshot`: The most recent snapshot.
#[derive(Debug)]
pub struct SwitchMonitor {
    c_tok: CancellationToken,
    handle: JoinHandle<Box<dyn StickReceiver>>,
    snapshot: watch::Receiver<ReceiverSnapshot>,
}

impl SwitchMonitor {
    pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

    /// Takes a first sample and starts polling `receiver` every `poll_interval`.
    pub fn start(mut receiver: Box<dyn StickReceiver>, poll_interval: Duration, parent: &CancellationToken) -> Self {
        let (tx, snapshot) = watch::channel(receiver.sample());
        let c_tok = parent.child_token();
        let task_tok = c_tok.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    () = task_tok.cancelled() => break,
                    _ = interval.tick() => (),
                }
                let sample = receiver.sample();
                tx.send_if_modified(|current| {
                    let changed = *current != sample;
                    *current = sample;
                    changed
                });
            }
            receiver
        });
        Self { c_tok, handle, snapshot }
    }

    pub fn latest(&self) -> ReceiverSnapshot { *self.snapshot.borrow() }

    pub fn subscribe(&self) -> watch::Receiver<ReceiverSnapshot> { self.snapshot.clone() }

    /// Stops polling and returns the receiver, `None` if the polling task panicked.
    pub async fn stop(self) -> Option<Box<dyn StickReceiver>> {
        self.c_tok.cancel();
        self.handle.await.ok()
    }
}

/// Turns switch positions into change events.
///
/// The first snapshot only establishes the positions, a switch that is already on at
/// startup does not fire.
#[derive(Debug, Default, Clone, Copy)]
pub struct SwitchTracker {
    last: Option<(bool, bool)>,
}

impl SwitchTracker {
    pub fn update(&mut self, snapshot: &ReceiverSnapshot) -> Vec<SwitchEvent> {
        let (recording, autopilot) = snapshot.switches();
        let Some((was_recording, was_autopilot)) = self.last.replace((recording, autopilot)) else {
            return Vec::new();
        };
        let mut events = Vec::new();
        if recording != was_recording {
            events.push(if recording { SwitchEvent::RecordingOn } else { SwitchEvent::RecordingOff });
        }
        if autopilot != was_autopilot {
            events.push(if autopilot { SwitchEvent::AutopilotOn } else { SwitchEvent::AutopilotOff });
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight_control::StickInputs;
    use std::sync::{Arc, Mutex};

    #[derive(Debug)]
    struct SharedReceiver(Arc<Mutex<ReceiverSnapshot>>);

    impl StickReceiver for SharedReceiver {
        fn sample(&mut self) -> ReceiverSnapshot { *self.0.lock().unwrap() }
    }

    fn switches(recording_switch: bool, autopilot_switch: bool) -> ReceiverSnapshot {
        ReceiverSnapshot { sticks: StickInputs::CENTRED, recording_switch, autopilot_switch }
    }

    #[test]
    fn test_tracker_reports_changes_only() {
        let mut tracker = SwitchTracker::default();
        assert!(tracker.update(&switches(true, false)).is_empty());
        assert!(tracker.update(&switches(true, false)).is_empty());
        assert_eq!(tracker.update(&switches(false, true)), [SwitchEvent::RecordingOff, SwitchEvent::AutopilotOn]);
        assert_eq!(tracker.update(&switches(false, false)), [SwitchEvent::AutopilotOff]);
        assert_eq!(tracker.update(&switches(true, false)), [SwitchEvent::RecordingOn]);
    }

    #[tokio::test]
    async fn test_monitor_publishes_and_stops() {
        let shared = Arc::new(Mutex::new(ReceiverSnapshot::default()));
        let parent = CancellationToken::new();
        let monitor =
            SwitchMonitor::start(Box::new(SharedReceiver(Arc::clone(&shared))), Duration::from_millis(2), &parent);
        assert_eq!(monitor.latest(), ReceiverSnapshot::default());

        let mut updates = monitor.subscribe();
        *shared.lock().unwrap() = switches(false, true);
        tokio::time::timeout(Duration::from_secs(5), updates.changed()).await.unwrap().unwrap();
        assert!(monitor.latest().autopilot_switch);

        assert!(monitor.stop().await.is_some());
        assert!(!parent.is_cancelled());
    }
}
