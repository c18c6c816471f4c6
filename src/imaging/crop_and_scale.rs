use crate::config::Resolution;
use crate::{log, warn};
use image::{RgbImage, imageops};

/// Centred horizontal crop and uniform scale turning a camera frame into an inference frame.
///
/// The crop keeps the full frame height and cuts equal margins left and right so that the
/// remaining columns have the inference aspect ratio. The scale then maps the frame height
/// onto the inference height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropScaleParams {
    pub original: Resolution,
    pub cropping_start: u32,
    pub cropping_end: u32,
    pub scale_factor: f64,
}

impl CropScaleParams {
    /// Computes the parameters for frames of resolution `original`.
    ///
    /// An inference aspect ratio wider than the original one cannot be produced by cropping,
    /// the original aspect ratio is used instead.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(original: Resolution, inference: Resolution) -> Self {
        let mut aspect_ratio = inference.aspect_ratio();
        if aspect_ratio > original.aspect_ratio() {
            warn!(
                "Inference aspect ratio {aspect_ratio:.3} is wider than the camera aspect ratio {:.3}, using the latter",
                original.aspect_ratio()
            );
            aspect_ratio = original.aspect_ratio();
        }
        let cropped_width = f64::from(original.height) * aspect_ratio;
        let margin = ((f64::from(original.width) - cropped_width) / 2.0).floor().max(0.0) as u32;
        Self {
            original,
            cropping_start: margin,
            cropping_end: original.width - margin,
            scale_factor: f64::from(inference.height) / f64::from(original.height),
        }
    }

    /// Resolution of the frames produced with these parameters.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn output(&self) -> Resolution {
        let scale = |len: u32| ((f64::from(len) * self.scale_factor).round() as u32).max(1);
        Resolution::new(scale(self.cropping_end - self.cropping_start), scale(self.original.height))
    }
}

/// Crops and scales `frame` as described by `params`.
///
/// `frame` is expected to have the resolution the parameters were computed for.
pub fn crop_and_scale(frame: &RgbImage, params: &CropScaleParams) -> RgbImage {
    let width = params.cropping_end.min(frame.width()).saturating_sub(params.cropping_start);
    let cropped = imageops::crop_imm(frame, params.cropping_start, 0, width, frame.height()).to_image();
    let output = params.output();
    imageops::resize(&cropped, output.width, output.height, imageops::FilterType::Triangle)
}

/// Normalizes frames of any resolution onto the inference resolution.
///
/// Parameters are recomputed whenever the incoming resolution changes.
#[derive(Debug, Clone)]
pub struct FrameNormalizer {
    inference: Resolution,
    params: Option<CropScaleParams>,
}

impl FrameNormalizer {
    pub fn new(inference: Resolution) -> Self { Self { inference, params: None } }

    pub fn normalize(&mut self, frame: &RgbImage) -> RgbImage {
        let resolution = Resolution::new(frame.width(), frame.height());
        let params = match self.params {
            Some(params) if params.original == resolution => params,
            _ => {
                let params = CropScaleParams::new(resolution, self.inference);
                log!(
                    "Cropping {}x{} frames to columns {}..{}, scaling by {:.4}",
                    resolution.width,
                    resolution.height,
                    params.cropping_start,
                    params.cropping_end,
                    params.scale_factor
                );
                self.params = Some(params);
                params
            }
        };
        crop_and_scale(frame, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_inference_from_vga() {
        let params = CropScaleParams::new(Resolution::new(640, 480), Resolution::new(100, 100));
        assert_eq!((params.cropping_start, params.cropping_end), (80, 560));
        assert!((params.scale_factor - 100.0 / 480.0).abs() < 1e-12);
        assert_eq!(params.output(), Resolution::new(100, 100));

        let frame = RgbImage::from_fn(640, 480, |x, _| if x < 320 { image::Rgb([255, 0, 0]) } else { image::Rgb([0, 0, 255]) });
        let scaled = crop_and_scale(&frame, &params);
        assert_eq!(scaled.dimensions(), (100, 100));
        assert_eq!(scaled.get_pixel(10, 50).0, [255, 0, 0]);
        assert_eq!(scaled.get_pixel(90, 50).0, [0, 0, 255]);
    }

    #[test]
    fn test_too_wide_inference_keeps_camera_aspect() {
        let params = CropScaleParams::new(Resolution::new(640, 480), Resolution::new(400, 100));
        assert_eq!((params.cropping_start, params.cropping_end), (0, 640));
        assert_eq!(params.output(), Resolution::new(133, 100));
    }

    #[test]
    fn test_normalizer_follows_resolution_changes() {
        let mut normalizer = FrameNormalizer::new(Resolution::new(100, 100));
        assert_eq!(normalizer.normalize(&RgbImage::new(640, 480)).dimensions(), (100, 100));
        assert_eq!(normalizer.normalize(&RgbImage::new(200, 100)).dimensions(), (100, 100));
        assert_eq!(normalizer.params.unwrap().original, Resolution::new(200, 100));
    }
}
