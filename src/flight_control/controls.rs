use serde::{Deserialize, Serialize};

/// Full servo travel in either direction.
pub const FULL_DEFLECTION: f64 = 1.0;

/// Pilot stick positions sampled at the start of a cycle, each in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StickInputs {
    pub aileron: f64,
    pub elevator: f64,
    pub rudder: f64,
}

impl StickInputs {
    pub const CENTRED: StickInputs = StickInputs { aileron: 0.0, elevator: 0.0, rudder: 0.0 };

    pub const fn new(aileron: f64, elevator: f64, rudder: f64) -> Self { Self { aileron, elevator, rudder } }
}

/// Per axis stick bias representing the pilot's neutral position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrimState {
    pub aileron_trim: f64,
    pub elevator_trim: f64,
}

impl TrimState {
    pub const fn new(aileron_trim: f64, elevator_trim: f64) -> Self { Self { aileron_trim, elevator_trim } }

    /// Checks whether the aileron or elevator stick left its trim position by more than `threshold`.
    pub fn is_exceeded_by(&self, sticks: &StickInputs, threshold: f64) -> bool {
        (sticks.aileron - self.aileron_trim).abs() > threshold
            || (sticks.elevator - self.elevator_trim).abs() > threshold
    }
}

/// Commanded control surface deflections.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlOutput {
    pub aileron: f64,
    pub elevator: f64,
}

impl ControlOutput {
    pub const NEUTRAL: ControlOutput = ControlOutput { aileron: 0.0, elevator: 0.0 };

    pub const fn new(aileron: f64, elevator: f64) -> Self { Self { aileron, elevator } }

    /// Both axes limited to `[-limit, limit]`.
    pub fn clamped(self, limit: f64) -> Self {
        Self::new(clamp_deflection(self.aileron, limit), clamp_deflection(self.elevator, limit))
    }

    /// Both axes with flipped sign, for airframes with reversed servos.
    pub fn reversed(self) -> Self { Self::new(-self.aileron, -self.elevator) }

    /// Adds the trims onto the respective axes.
    pub fn trimmed(self, trims: &TrimState) -> Self {
        Self::new(self.aileron + trims.aileron_trim, self.elevator + trims.elevator_trim)
    }
}

/// Limits a deflection to `[-limit, limit]`.
///
/// A non-finite deflection is a logic error upstream: debug builds assert, release builds
/// fall back to neutral.
pub fn clamp_deflection(value: f64, limit: f64) -> f64 {
    debug_assert!(value.is_finite(), "non-finite deflection {value}");
    if value.is_finite() { value.clamp(-limit, limit) } else { 0.0 }
}

/// The attitude a flight program works with in the current cycle.
///
/// Follows the detector while the horizon is good and coasts on the last good values for
/// a short while after it is lost. `roll_deg` is signed, wings level is `0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeldAttitude {
    pub roll_deg: f64,
    pub pitch_deg: f64,
    pub is_good: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_deflection() {
        assert!((clamp_deflection(0.7, 0.4) - 0.4).abs() < f64::EPSILON);
        assert!((clamp_deflection(-0.7, 0.4) + 0.4).abs() < f64::EPSILON);
        assert!((clamp_deflection(0.1, 0.4) - 0.1).abs() < f64::EPSILON);
        let out = ControlOutput::new(0.5, -0.1).clamped(0.4).reversed();
        assert_eq!(out, ControlOutput::new(-0.4, 0.1));
    }

    #[test]
    fn test_trim_exceeded() {
        let trims = TrimState::new(0.1, -0.1);
        assert!(!trims.is_exceeded_by(&StickInputs::new(0.3, 0.1, 1.0), 0.25));
        assert!(trims.is_exceeded_by(&StickInputs::new(0.36, 0.0, 0.0), 0.25));
        assert!(trims.is_exceeded_by(&StickInputs::new(0.0, -0.4, 0.0), 0.25));
    }
}
