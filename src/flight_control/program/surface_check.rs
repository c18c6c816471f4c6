use super::ProgramStep;
use crate::config::ControllerConfig;
use crate::flight_control::controls::ControlOutput;

/// Preflight check sweeping first the ailerons and then the elevator back and forth.
///
/// The whole pattern is precomputed from the configuration: each axis moves at a fixed
/// increment per cycle between `±max_deflection`, reverses direction a fixed number of times,
/// returns to neutral, and the check ends with both surfaces neutral.
#[derive(Debug, Clone)]
pub struct SurfaceCheck {
    pattern: Vec<ControlOutput>,
    iteration: usize,
}

impl SurfaceCheck {
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn new(config: &ControllerConfig, fps: u32) -> Self {
        let amplitude = config.max_deflection;
        let increment = config.surface_check_rate / f64::from(fps);
        let steps_to_full = ((amplitude / increment).round() as i64).max(1);
        let sweep = sweep_positions(steps_to_full, config.surface_check_reversals);
        let to_deflection = |position: i64| amplitude * position as f64 / steps_to_full as f64;

        let mut pattern: Vec<ControlOutput> = Vec::with_capacity(2 * sweep.len() + 1);
        pattern.extend(sweep.iter().map(|&p| ControlOutput::new(to_deflection(p), 0.0)));
        pattern.extend(sweep.iter().map(|&p| ControlOutput::new(0.0, to_deflection(p))));
        pattern.push(ControlOutput::NEUTRAL);
        Self { pattern, iteration: 0 }
    }

    /// Number of cycles the complete check takes.
    pub fn total_iterations(&self) -> usize { self.pattern.len() }

    /// Emits the next sample of the pattern, finishing with the last one.
    pub fn step(&mut self) -> ProgramStep {
        let last = self.pattern.len() - 1;
        let index = self.iteration.min(last);
        self.iteration += 1;
        let output = self.pattern[index];
        if index == last { ProgramStep::finished(output) } else { ProgramStep::running(output) }
    }
}

/// Integer positions of one axis sweep, in units of one increment.
///
/// Starts just after neutral, alternates between `+full` and `-full` for `reversals`
/// direction changes and ends back at neutral.
fn sweep_positions(full: i64, reversals: u32) -> Vec<i64> {
    let mut positions = Vec::new();
    let mut position = 0_i64;
    let turning_points = (0..reversals).map(|n| if n % 2 == 0 { full } else { -full });
    for target in turning_points.chain(std::iter::once(0)) {
        while position != target {
            position += (target - position).signum();
            positions.push(position);
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_positions() {
        assert_eq!(sweep_positions(2, 0), Vec::<i64>::new());
        assert_eq!(sweep_positions(2, 1), vec![1, 2, 1, 0]);
        assert_eq!(sweep_positions(2, 2), vec![1, 2, 1, 0, -1, -2, -1, 0]);
        assert_eq!(sweep_positions(1, 3), vec![1, 0, -1, 0, 1, 0]);
    }

    #[test]
    fn test_reversal_count() {
        let positions = sweep_positions(3, 7);
        let reversals = positions
            .windows(3)
            .filter(|w| (w[1] - w[0]).signum() != (w[2] - w[1]).signum())
            .count();
        assert_eq!(reversals, 7);
        assert_eq!(positions.last(), Some(&0));
    }
}
