use super::{
    attitude::AttitudeSample,
    diagnostics::DetectionTrace,
    edge_grid::EdgeGrid,
    prediction::{PredictedHorizon, PredictionState},
};
use crate::common::{
    Vec2D,
    geometry::{contour_area, fit_line, normalize_angle},
};
use crate::config::{DetectorConfig, Resolution};
use crate::event;
use image::{GrayImage, Luma, RgbImage, imageops};
use imageproc::{contours::find_contours, contrast::otsu_level, filter::gaussian_blur_f32, gradients::sobel_gradients};

/// Finds the sky/ground boundary in a frame and turns it into an [`AttitudeSample`].
///
/// The detector binarizes the frame, takes the largest bright region as the sky and fits a
/// line through those points of its outline that sit on a real brightness edge. The last two
/// good horizons predict where the next one should be, and while such a prediction exists,
/// points too far away from it are ignored.
///
/// # Fields
/// - `config`: Detector tuning.
/// - `fov_deg`: Vertical field of view of the camera.
/// - `exclusion_thresh_px`: Exclusion threshold converted from pitch degrees to pixels.
/// - `prediction`: Memory of the previous horizons.
#[derive(Debug, Clone)]
pub struct HorizonDetector {
    config: DetectorConfig,
    fov_deg: f64,
    exclusion_thresh_px: f64,
    prediction: PredictionState,
}

impl HorizonDetector {
    /// Maximum number of frame border points averaged to decide on which side the sky is.
    const MAX_BORDER_POINTS: usize = 20;
    const MASK_ON: Luma<u8> = Luma([u8::MAX]);
    const MASK_OFF: Luma<u8> = Luma([0]);

    /// Creates a detector for frames of the given inference resolution.
    ///
    /// # Arguments
    /// * `config` - Detector tuning, the exclusion threshold is given in degrees of pitch.
    /// * `fov_deg` - Vertical field of view of the camera in degrees.
    /// * `inference` - Resolution of the frames passed to [`Self::detect`].
    pub fn new(config: DetectorConfig, fov_deg: f64, inference: Resolution) -> Self {
        let exclusion_thresh_px = config.exclusion_thresh * f64::from(inference.height) / fov_deg;
        Self { config, fov_deg, exclusion_thresh_px, prediction: PredictionState::new() }
    }

    /// The horizon the next frame is filtered against, if any.
    pub fn predicted(&self) -> Option<PredictedHorizon> { self.prediction.predicted() }

    /// Estimates the attitude from `frame` and advances the prediction.
    ///
    /// Never fails: frames without a usable horizon yield [`AttitudeSample::NO_HORIZON`].
    pub fn detect(&mut self, frame: &RgbImage) -> AttitudeSample { self.analyse(frame).0 }

    /// Like [`Self::detect`], additionally rendering the diagnostic mask.
    ///
    /// The returned attitude is identical to the one [`Self::detect`] would have produced.
    pub fn detect_with_diagnostics(&mut self, frame: &RgbImage) -> (AttitudeSample, RgbImage) {
        let (sample, trace) = self.analyse(frame);
        (sample, trace.render(self.fov_deg, self.config.exclusion_thresh))
    }

    fn analyse(&mut self, frame: &RgbImage) -> (AttitudeSample, DetectionTrace) {
        let had_lock = self.prediction.predicted().is_some();
        let (sample, trace) = self.find_horizon(frame);
        self.prediction.push(sample.good_attitude());

        match (had_lock, self.prediction.predicted().is_some()) {
            (false, true) => event!("Horizon lock acquired"),
            (true, false) => event!("Horizon lock lost"),
            _ => (),
        }
        (sample, trace)
    }

    #[allow(clippy::cast_precision_loss)]
    fn find_horizon(&self, frame: &RgbImage) -> (AttitudeSample, DetectionTrace) {
        let predicted = self.prediction.predicted();
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return (AttitudeSample::NO_HORIZON, DetectionTrace::new(GrayImage::new(0, 0), predicted));
        }

        let mask = self.binarize(frame);
        let edges = EdgeGrid::from_gradients(
            &sobel_gradients(&imageops::grayscale(frame)),
            self.config.pooling_block,
            self.config.edge_threshold,
        );
        let largest = outlines(&mask)
            .into_iter()
            .map(|points| (contour_area(&points), points))
            .max_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(_, points)| points);
        let mut trace = DetectionTrace::new(mask, predicted);
        let Some(outline) = largest else {
            return (AttitudeSample::NO_HORIZON, trace);
        };

        let (border, interior): (Vec<_>, Vec<_>) = outline
            .iter()
            .copied()
            .partition(|p| p.x() == 0 || p.y() == 0 || p.x() == width - 1 || p.y() == height - 1);
        let Some(sky_side) = mean_point(&stride_sample(&border, border.len() / Self::MAX_BORDER_POINTS))
            .or_else(|| mean_point(&interior))
        else {
            return (AttitudeSample::NO_HORIZON, trace);
        };

        trace.sampled = stride_sample(&interior, interior.len().div_ceil(self.config.max_sample_points.max(1)));
        trace.surviving = trace
            .sampled
            .iter()
            .filter(|p| edges.is_edge(p.x(), p.y()))
            .filter(|p| {
                predicted.is_none_or(|horizon| {
                    horizon.distance_px(p.to_f64(), width, height, self.fov_deg) < self.exclusion_thresh_px
                })
            })
            .copied()
            .collect();

        if trace.surviving.len() < self.config.min_points {
            return (AttitudeSample::NO_HORIZON, trace);
        }
        let points: Vec<Vec2D<f64>> = trace.surviving.iter().map(|p| p.to_f64()).collect();
        let Some(line) = fit_line(&points) else {
            return (AttitudeSample::NO_HORIZON, trace);
        };

        let sky_is_up = line.y_at(sky_side.x()) > sky_side.y();
        let roll = normalize_angle(line.angle_deg(), sky_is_up);

        let height_f = f64::from(height);
        let center = Vec2D::new(f64::from(width) / 2.0, height_f / 2.0);
        let horizon_at_center = line.y_at(center.x());
        let nose_up = (center.y() < horizon_at_center && sky_is_up) || (center.y() > horizon_at_center && !sky_is_up);
        let pitch_magnitude = line.distance_to(center) / height_f * self.fov_deg;
        let pitch = if nose_up { pitch_magnitude } else { -pitch_magnitude };

        let mean_residual = points.iter().map(|p| line.distance_to(*p)).sum::<f64>() / points.len() as f64;
        let variance = mean_residual / height_f * 100.0;

        (AttitudeSample::fitted(roll, pitch, variance, self.config.acceptable_variance), trace)
    }

    /// Grey scale with sky colours saturated, optionally smoothed, then split at the Otsu level.
    fn binarize(&self, frame: &RgbImage) -> GrayImage {
        let brightness = self.config.sky.brightness(frame);
        let smoothed = if self.config.smoothing_sigma > 0.0 {
            gaussian_blur_f32(&brightness, self.config.smoothing_sigma)
        } else {
            brightness
        };
        let level = otsu_level(&smoothed);
        GrayImage::from_fn(smoothed.width(), smoothed.height(), |x, y| {
            if smoothed.get_pixel(x, y).0[0] > level { Self::MASK_ON } else { Self::MASK_OFF }
        })
    }
}

/// Outlines of all regions in `mask`, with everything outside the frame treated as background.
///
/// The border follower only starts an outline at a foreground pixel with background to its
/// left, so a region running along the left frame edge would be missed without the padding.
fn outlines(mask: &GrayImage) -> Vec<Vec<Vec2D<u32>>> {
    let mut padded = GrayImage::new(mask.width() + 2, mask.height() + 2);
    imageops::replace(&mut padded, mask, 1, 1);
    find_contours::<u32>(&padded)
        .into_iter()
        .map(|contour| {
            contour.points.into_iter().map(|p| Vec2D::new(p.x.saturating_sub(1), p.y.saturating_sub(1))).collect()
        })
        .collect()
}

/// Every `step`-th point, or all points if `step` is below two.
fn stride_sample(points: &[Vec2D<u32>], step: usize) -> Vec<Vec2D<u32>> {
    points.iter().step_by(step.max(1)).copied().collect()
}

#[allow(clippy::cast_precision_loss)]
fn mean_point(points: &[Vec2D<u32>]) -> Option<Vec2D<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(Vec2D::<f64>::zero(), |acc, p| acc + p.to_f64());
    Some(Vec2D::new(sum.x() / points.len() as f64, sum.y() / points.len() as f64))
}
