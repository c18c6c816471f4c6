use crate::info;
use chrono::{DateTime, Utc};

/// Measures the rate the control loop actually achieves.
///
/// The rate is only reported, a slow loop is never throttled or aborted.
#[derive(Debug, Clone, Copy)]
pub struct CycleTimer {
    window_start: DateTime<Utc>,
    window_cycles: u32,
    report_every: u32,
    target_fps: u32,
}

impl CycleTimer {
    pub fn new(target_fps: u32) -> Self { Self::starting_at(target_fps, Utc::now()) }

    fn starting_at(target_fps: u32, start: DateTime<Utc>) -> Self {
        Self { window_start: start, window_cycles: 0, report_every: target_fps.max(1), target_fps }
    }

    /// Counts a finished cycle, logging and returning the achieved rate once per window.
    pub fn tick(&mut self) -> Option<f64> { self.tick_at(Utc::now()) }

    fn tick_at(&mut self, now: DateTime<Utc>) -> Option<f64> {
        self.window_cycles += 1;
        if self.window_cycles < self.report_every {
            return None;
        }
        let elapsed = now - self.window_start;
        #[allow(clippy::cast_precision_loss)]
        let secs = elapsed.num_microseconds().unwrap_or(i64::MAX) as f64 / 1e6;
        let rate = if secs > 0.0 { f64::from(self.window_cycles) / secs } else { f64::INFINITY };
        info!("Control loop at {rate:.1} Hz (target {} Hz)", self.target_fps);
        self.window_start = now;
        self.window_cycles = 0;
        Some(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_reports_once_per_window() {
        let start = Utc::now();
        let mut timer = CycleTimer::starting_at(4, start);
        for i in 1..4 {
            assert!(timer.tick_at(start + TimeDelta::milliseconds(250 * i)).is_none());
        }
        let rate = timer.tick_at(start + TimeDelta::seconds(2)).unwrap();
        assert!((rate - 2.0).abs() < 1e-9);
        assert!(timer.tick_at(start + TimeDelta::milliseconds(2250)).is_none());
    }
}
