use crate::common::{
    Vec2D,
    geometry::{angle_delta, distance_to_directed_line, wrap_full_rotation},
};

/// Horizon expected in the next frame, extrapolated from the two previous good horizons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictedHorizon {
    pub roll_deg: f64,
    pub pitch_deg: f64,
}

impl PredictedHorizon {
    /// Places the predicted horizon in pixel space.
    ///
    /// The line runs along the roll direction and is offset from the frame center
    /// perpendicular to it by the pitch, converted to pixels via the vertical field of view.
    ///
    /// # Returns
    /// A point on the line and the unit direction of the line.
    pub fn line_in_frame(&self, width: u32, height: u32, fov_deg: f64) -> (Vec2D<f64>, Vec2D<f64>) {
        let height_f = f64::from(height);
        let center = Vec2D::new(f64::from(width) / 2.0, height_f / 2.0);
        let offset_px = self.pitch_deg / fov_deg * height_f;
        let normal = Vec2D::from_angle_deg(self.roll_deg + 90.0);
        (center + normal * offset_px, Vec2D::from_angle_deg(self.roll_deg))
    }

    /// Perpendicular pixel distance of `point` to the predicted horizon.
    pub fn distance_px(&self, point: Vec2D<f64>, width: u32, height: u32, fov_deg: f64) -> f64 {
        let (anchor, dir) = self.line_in_frame(width, height, fov_deg);
        distance_to_directed_line(point, anchor, dir)
    }
}

/// Temporal memory of the detector.
///
/// Keeps the two most recent detector results, `None` for frames without a good horizon.
/// A prediction only exists while both slots hold good horizons.
#[derive(Debug, Clone, Default)]
pub struct PredictionState {
    recent: [Option<(f64, f64)>; 2],
    predicted: Option<PredictedHorizon>,
}

impl PredictionState {
    pub fn new() -> Self { Self::default() }

    /// The horizon predicted for the upcoming frame, if any.
    pub fn predicted(&self) -> Option<PredictedHorizon> { self.predicted }

    /// Records the outcome of a frame and recomputes the prediction.
    ///
    /// # Arguments
    /// * `horizon` - `(roll, pitch)` in degrees of a good horizon, `None` otherwise.
    pub fn push(&mut self, horizon: Option<(f64, f64)>) {
        self.recent = [self.recent[1], horizon];
        self.predicted = match self.recent {
            [Some((roll_1, pitch_1)), Some((roll_2, pitch_2))] => Some(PredictedHorizon {
                roll_deg: wrap_full_rotation(roll_2 + angle_delta(roll_1, roll_2)),
                pitch_deg: pitch_2 + (pitch_2 - pitch_1),
            }),
            _ => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_prediction_requires_two_good_horizons() {
        let mut state = PredictionState::new();
        assert!(state.predicted().is_none());
        state.push(Some((10.0, 1.0)));
        assert!(state.predicted().is_none());
        state.push(Some((12.0, 2.0)));
        let predicted = state.predicted().unwrap();
        assert!((predicted.roll_deg - 14.0).abs() < EPS);
        assert!((predicted.pitch_deg - 3.0).abs() < EPS);

        state.push(None);
        assert!(state.predicted().is_none());
        state.push(Some((12.0, 2.0)));
        assert!(state.predicted().is_none());
    }

    #[test]
    fn test_prediction_wraps_roll() {
        let mut state = PredictionState::new();
        state.push(Some((358.0, 0.0)));
        state.push(Some((1.0, 0.0)));
        assert!((state.predicted().unwrap().roll_deg - 4.0).abs() < EPS);
    }

    #[test]
    fn test_predicted_line_placement() {
        // level flight, nose up: horizon sits below the frame center
        let level = PredictedHorizon { roll_deg: 0.0, pitch_deg: 10.0 };
        let (anchor, dir) = level.line_in_frame(100, 100, 50.0);
        assert!((anchor.x() - 50.0).abs() < EPS);
        assert!((anchor.y() - 70.0).abs() < EPS);
        assert!((dir.y()).abs() < EPS);
        assert!(level.distance_px(Vec2D::new(3.0, 70.0), 100, 100, 50.0) < EPS);
        assert!((level.distance_px(Vec2D::new(50.0, 50.0), 100, 100, 50.0) - 20.0).abs() < EPS);

        // knife edge: the predicted line is vertical and still measurable
        let knife_edge = PredictedHorizon { roll_deg: 90.0, pitch_deg: 0.0 };
        assert!((knife_edge.distance_px(Vec2D::new(60.0, 10.0), 100, 100, 50.0) - 10.0).abs() < 1e-6);
    }
}
