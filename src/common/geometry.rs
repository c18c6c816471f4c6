use super::vec2d::Vec2D;
use itertools::Itertools;

/// Degrees in a full rotation.
pub const FULL_ROTATION: f64 = 360.0;
/// Degrees in a half rotation.
pub const HALF_ROTATION: f64 = 180.0;
/// Minimum spread of the x-coordinates (variance in px²) for a line to be fitted with x as the
/// independent variable. Below this the point set is treated as a vertical line.
const MIN_X_VARIANCE: f64 = 1e-9;

/// A line in pixel space, `y = slope * x + intercept`.
///
/// Vertical lines cannot be represented and are rejected by [`fit_line`], so neither
/// evaluating nor measuring distances against a `FittedLine` ever divides by zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedLine {
    slope: f64,
    intercept: f64,
}

impl FittedLine {
    pub fn new(slope: f64, intercept: f64) -> Self { Self { slope, intercept } }

    pub fn slope(&self) -> f64 { self.slope }

    pub fn intercept(&self) -> f64 { self.intercept }

    /// Evaluates the line at the given column.
    pub fn y_at(&self, x: f64) -> f64 { self.slope * x + self.intercept }

    /// Perpendicular distance of `point` to this line.
    ///
    /// ```text
    /// d = |m * x - y + b| / sqrt(m² + 1)
    /// ```
    pub fn distance_to(&self, point: Vec2D<f64>) -> f64 {
        (self.slope * point.x() - point.y() + self.intercept).abs() / self.slope.hypot(1.0)
    }

    /// Raw inclination of the line in degrees, in `(-90, 90)`.
    pub fn angle_deg(&self) -> f64 { self.slope.atan2(1.0).to_degrees() }
}

/// Ordinary least squares fit of `y` over `x`.
///
/// # Returns
/// - `None` if fewer than two points are given or all points (nearly) share one column,
///   i.e. the best fit would be a vertical line.
#[allow(clippy::cast_precision_loss)]
pub fn fit_line(points: &[Vec2D<f64>]) -> Option<FittedLine> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(Vec2D::x).sum::<f64>() / n;
    let mean_y = points.iter().map(Vec2D::y).sum::<f64>() / n;
    let (s_xx, s_xy) = points.iter().fold((0.0, 0.0), |(s_xx, s_xy), p| {
        let dx = p.x() - mean_x;
        (s_xx + dx * dx, s_xy + dx * (p.y() - mean_y))
    });
    if s_xx / n < MIN_X_VARIANCE {
        return None;
    }
    let slope = s_xy / s_xx;
    let line = FittedLine::new(slope, mean_y - slope * mean_x);
    (line.slope.is_finite() && line.intercept.is_finite()).then_some(line)
}

/// Perpendicular distance of `point` to the line through `anchor` with unit direction `dir`.
///
/// Unlike [`FittedLine::distance_to`] this form also covers vertical lines.
pub fn distance_to_directed_line(point: Vec2D<f64>, anchor: Vec2D<f64>, dir: Vec2D<f64>) -> f64 {
    dir.cross(anchor.to(point)).abs()
}

/// Returns `true` if `angle` (in `[0, 360)`) lies in the sector where the sky is above the
/// horizon line, i.e. `[0, 90) ∪ [270, 360)`.
///
/// Exactly one of `angle` and `angle ± 180` lies in this sector.
pub fn in_sky_up_sector(angle: f64) -> bool { angle < FULL_ROTATION * 0.25 || angle >= FULL_ROTATION * 0.75 }

/// Resolves the 180° ambiguity of a line inclination.
///
/// # Arguments
/// - `raw_angle`: Inclination of the horizon line in degrees, any finite value.
/// - `sky_is_up`: Whether the sky lies above the line in the image.
///
/// # Returns
/// - The roll in `[0, 360)` whose sky sector membership matches `sky_is_up`.
pub fn normalize_angle(raw_angle: f64, sky_is_up: bool) -> f64 {
    let mut roll = wrap_full_rotation(raw_angle);
    if in_sky_up_sector(roll) != sky_is_up {
        roll = if roll < HALF_ROTATION { roll + HALF_ROTATION } else { roll - HALF_ROTATION };
    }
    roll
}

/// Wraps an angle in degrees into `[0, 360)`.
pub fn wrap_full_rotation(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(FULL_ROTATION);
    // rem_euclid may round tiny negative inputs up to exactly 360
    if wrapped >= FULL_ROTATION { 0.0 } else { wrapped }
}

/// Maps a roll in `[0, 360)` onto `(-180, 180]`, so wings level is the zero crossing.
pub fn signed_roll(roll: f64) -> f64 { if roll > HALF_ROTATION { roll - FULL_ROTATION } else { roll } }

/// Shortest signed angular difference `to - from` in degrees, in `(-180, 180]`.
pub fn angle_delta(from: f64, to: f64) -> f64 { signed_roll(wrap_full_rotation(to - from)) }

/// Enclosed area of a closed pixel contour (shoelace formula).
pub fn contour_area(points: &[Vec2D<u32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice_area: f64 = points
        .iter()
        .map(|p| p.to_f64())
        .circular_tuple_windows()
        .map(|(a, b)| a.cross(b))
        .sum();
    twice_area.abs() / 2.0
}
