use super::prediction::PredictedHorizon;
use crate::common::Vec2D;
use image::{GrayImage, Rgb, RgbImage, imageops};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

/// Intermediate results of one detector pass, kept for rendering the diagnostic mask.
#[derive(Debug, Clone)]
pub(crate) struct DetectionTrace {
    /// Binarized frame, sky (or the brighter region) at 255.
    pub mask: GrayImage,
    /// Interior contour points after subsampling.
    pub sampled: Vec<Vec2D<u32>>,
    /// Points that passed the edge and prediction filters.
    pub surviving: Vec<Vec2D<u32>>,
    /// The prediction the points were filtered against.
    pub predicted: Option<PredictedHorizon>,
}

impl DetectionTrace {
    /// Upscaling applied to the mask so single points remain visible.
    const SCALE: u32 = 5;
    const POINT_RADIUS: i32 = 4;
    const SAMPLED_COLOUR: Rgb<u8> = Rgb([255, 0, 0]);
    const SURVIVING_COLOUR: Rgb<u8> = Rgb([0, 255, 0]);
    const PREDICTION_COLOUR: Rgb<u8> = Rgb([255, 150, 0]);

    pub fn new(mask: GrayImage, predicted: Option<PredictedHorizon>) -> Self {
        Self { mask, sampled: Vec::new(), surviving: Vec::new(), predicted }
    }

    /// Renders the mask with the sampled points in red, the surviving points in green
    /// and the exclusion band around the predicted horizon in orange.
    ///
    /// # Arguments
    /// * `fov_deg` - Vertical field of view used to place the predicted horizon.
    /// * `exclusion_deg` - Half width of the exclusion band in degrees of pitch.
    #[allow(clippy::cast_possible_wrap, clippy::cast_precision_loss)]
    pub fn render(&self, fov_deg: f64, exclusion_deg: f64) -> RgbImage {
        let (width, height) = self.mask.dimensions();
        let mut canvas = imageops::resize(
            &grey_to_rgb(&self.mask),
            width * Self::SCALE,
            height * Self::SCALE,
            imageops::FilterType::Nearest,
        );
        let scale = f64::from(Self::SCALE);

        if let Some(predicted) = self.predicted {
            let reach = f64::from(width).hypot(f64::from(height));
            for offset in [-exclusion_deg, exclusion_deg] {
                let bound = PredictedHorizon { pitch_deg: predicted.pitch_deg + offset, ..predicted };
                let (anchor, dir) = bound.line_in_frame(width, height, fov_deg);
                let start = (anchor - dir * reach) * scale;
                let end = (anchor + dir * reach) * scale;
                draw_line_segment_mut(
                    &mut canvas,
                    (start.x() as f32, start.y() as f32),
                    (end.x() as f32, end.y() as f32),
                    Self::PREDICTION_COLOUR,
                );
            }
        }

        let centre = |p: &Vec2D<u32>| {
            let half = Self::SCALE / 2;
            ((p.x() * Self::SCALE + half) as i32, (p.y() * Self::SCALE + half) as i32)
        };
        for point in &self.sampled {
            draw_filled_circle_mut(&mut canvas, centre(point), Self::POINT_RADIUS, Self::SAMPLED_COLOUR);
        }
        for point in &self.surviving {
            draw_filled_circle_mut(&mut canvas, centre(point), Self::POINT_RADIUS, Self::SURVIVING_COLOUR);
        }
        canvas
    }
}

fn grey_to_rgb(grey: &GrayImage) -> RgbImage {
    RgbImage::from_fn(grey.width(), grey.height(), |x, y| {
        let value = grey.get_pixel(x, y).0[0];
        Rgb([value, value, value])
    })
}
