use image::{GrayImage, Luma, RgbImage, imageops};
use serde::{Deserialize, Serialize};

/// Hue/saturation/value window of blue sky.
///
/// Hue uses the 8-bit half-degree scale (`0..=180`), saturation and value `0..=255`.
/// Pixels inside the window are pushed to full brightness before binarization, which
/// separates a bright blue sky from bright ground glare of similar luminance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyFilter {
    pub hue_min: u8,
    pub hue_max: u8,
    pub saturation_min: u8,
    pub value_min: u8,
}

impl Default for SkyFilter {
    fn default() -> Self { Self { hue_min: 109, hue_max: 153, saturation_min: 0, value_min: 116 } }
}

impl SkyFilter {
    /// Checks whether an RGB pixel falls inside the sky window.
    pub fn matches(&self, rgb: [u8; 3]) -> bool {
        let (hue, saturation, value) = hsv(rgb);
        (self.hue_min..=self.hue_max).contains(&hue)
            && saturation >= self.saturation_min
            && value >= self.value_min
    }

    /// Grey scale brightness of `frame` with every sky coloured pixel saturated to white.
    pub fn brightness(&self, frame: &RgbImage) -> GrayImage {
        let mut grey = imageops::grayscale(frame);
        for (grey_px, rgb_px) in grey.pixels_mut().zip(frame.pixels()) {
            if self.matches(rgb_px.0) {
                *grey_px = Luma([u8::MAX]);
            }
        }
        grey
    }
}

/// Converts an RGB triple into 8-bit HSV with hue on the half-degree scale.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn hsv([r, g, b]: [u8; 3]) -> (u8, u8, u8) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    if max == 0 {
        return (0, 0, 0);
    }
    let delta = f32::from(max - min);
    let saturation = (255.0 * delta / f32::from(max)).round() as u8;
    if max == min {
        return (0, saturation, max);
    }
    let (rf, gf, bf) = (f32::from(r), f32::from(g), f32::from(b));
    let degrees = if max == r {
        60.0 * (gf - bf) / delta
    } else if max == g {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    let degrees = if degrees < 0.0 { degrees + 360.0 } else { degrees };
    ((degrees / 2.0).round() as u8 % 180, saturation, max)
}
