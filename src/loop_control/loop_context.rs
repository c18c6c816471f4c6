use tokio_util::sync::CancellationToken;

/// State of the control loop that outlives a single cycle.
///
/// # Fields
/// - `recording`: Whether diagnostics are being recorded.
/// - `autopilot`: Whether the autopilot switch is engaged.
/// - `c_tok`: Cancelled on shutdown, stops the loop between cycles.
/// - `cycles`: Completed control cycles.
/// - `good_cycles`: Cycles with a good horizon.
#[derive(Debug, Default)]
pub struct LoopContext {
    recording: bool,
    autopilot: bool,
    c_tok: CancellationToken,
    cycles: u64,
    good_cycles: u64,
}

impl LoopContext {
    pub fn new(c_tok: CancellationToken) -> Self { Self { c_tok, ..Self::default() } }

    pub fn is_running(&self) -> bool { !self.c_tok.is_cancelled() }
    pub fn is_recording(&self) -> bool { self.recording }
    pub fn is_autopilot(&self) -> bool { self.autopilot }
    pub fn set_recording(&mut self, recording: bool) { self.recording = recording; }
    pub fn set_autopilot(&mut self, autopilot: bool) { self.autopilot = autopilot; }

    pub fn c_tok(&self) -> &CancellationToken { &self.c_tok }

    /// Requests the loop to stop after the current cycle.
    pub fn shutdown(&self) { self.c_tok.cancel(); }

    pub fn count_cycle(&mut self, horizon_good: bool) {
        self.cycles += 1;
        if horizon_good {
            self.good_cycles += 1;
        }
    }

    pub fn cycles(&self) -> u64 { self.cycles }
    pub fn good_cycles(&self) -> u64 { self.good_cycles }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_and_counters() {
        let mut context = LoopContext::new(CancellationToken::new());
        assert!(context.is_running() && !context.is_recording() && !context.is_autopilot());
        context.set_recording(true);
        context.set_autopilot(true);
        context.count_cycle(true);
        context.count_cycle(false);
        assert!(context.is_recording() && context.is_autopilot());
        assert_eq!((context.cycles(), context.good_cycles()), (2, 1));
        context.shutdown();
        assert!(!context.is_running());
    }
}
