use serde::{Deserialize, Serialize};

/// Attitude estimate derived from a single frame.
///
/// All optional fields are `None` if no horizon was found in the frame.
/// `roll_deg` lies in `[0, 360)`, `variance` is the mean point to line residual
/// in percent of the frame height and is never negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AttitudeSample {
    pub roll_deg: Option<f64>,
    pub pitch_deg: Option<f64>,
    pub variance: Option<f64>,
    pub is_good: bool,
}

impl AttitudeSample {
    /// The "no horizon found" sentinel.
    pub const NO_HORIZON: AttitudeSample =
        AttitudeSample { roll_deg: None, pitch_deg: None, variance: None, is_good: false };

    /// Builds a sample from a fitted horizon. `is_good` follows from the variance threshold.
    pub fn fitted(roll_deg: f64, pitch_deg: f64, variance: f64, acceptable_variance: f64) -> Self {
        debug_assert!(variance >= 0.0, "negative fit variance {variance}");
        Self {
            roll_deg: Some(roll_deg),
            pitch_deg: Some(pitch_deg),
            variance: Some(variance),
            is_good: variance < acceptable_variance,
        }
    }

    /// Roll and pitch of a good sample, `None` otherwise.
    pub fn good_attitude(&self) -> Option<(f64, f64)> {
        if !self.is_good {
            return None;
        }
        self.roll_deg.zip(self.pitch_deg)
    }
}
