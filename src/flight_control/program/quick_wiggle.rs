use super::ProgramStep;
use crate::config::{ControllerConfig, secs_to_cycles};
use crate::flight_control::controls::ControlOutput;

/// Short deflection of both surfaces confirming a switch to the pilot.
#[derive(Debug, Clone)]
pub struct QuickWiggle {
    deflection: f64,
    remaining: usize,
}

impl QuickWiggle {
    pub fn new(config: &ControllerConfig, fps: u32) -> Self {
        let remaining = secs_to_cycles(config.wiggle_secs, fps).max(1);
        Self { deflection: config.wiggle_deflection, remaining }
    }

    pub fn step(&mut self) -> ProgramStep {
        let output = ControlOutput::new(self.deflection, self.deflection);
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 { ProgramStep::finished(output) } else { ProgramStep::running(output) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wiggle_duration() {
        let config = ControllerConfig::default();
        let mut wiggle = QuickWiggle::new(&config, 30);
        for cycle in 1..=15 {
            let step = wiggle.step();
            assert_eq!(step.output, ControlOutput::new(0.1, 0.1));
            assert_eq!(step.is_finished, cycle == 15, "cycle {cycle}");
        }
    }

    #[test]
    fn test_wiggle_lasts_at_least_one_cycle() {
        let config = ControllerConfig { wiggle_secs: 0.0, ..ControllerConfig::default() };
        assert!(QuickWiggle::new(&config, 30).step().is_finished);
    }
}
