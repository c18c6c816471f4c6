use crate::common::vec2d::Vec2D;
use crate::config::Resolution;
use crate::{error, log, warn};
use async_trait::async_trait;
use image::{Rgb, RgbImage};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
};
use strum_macros::Display;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Display)]
pub enum FrameSourceError {
    Io(std::io::Error),
    Decode(image::ImageError),
    EmptySequence(PathBuf),
}

impl std::error::Error for FrameSourceError {}

/// Anything delivering camera frames one at a time.
#[async_trait]
pub trait FrameSource: Send {
    /// Nominal resolution of the delivered frames.
    fn resolution(&self) -> Resolution;

    /// The next frame, `None` once the source is exhausted.
    async fn next_frame(&mut self) -> Result<Option<RgbImage>, FrameSourceError>;
}

/// Replays a directory of still images in file name order.
#[derive(Debug)]
pub struct ImageSequenceSource {
    pending: VecDeque<PathBuf>,
    resolution: Resolution,
}

impl ImageSequenceSource {
    const EXTENSIONS: [&'static str; 3] = ["png", "jpg", "jpeg"];

    /// Collects the image files in `dir`, the first one determines the nominal resolution.
    pub async fn open(dir: &Path) -> Result<Self, FrameSourceError> {
        let mut entries = tokio::fs::read_dir(dir).await.map_err(FrameSourceError::Io)?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(FrameSourceError::Io)? {
            let path = entry.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| Self::EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
            if is_image {
                paths.push(path);
            }
        }
        paths.sort();
        let Some(first) = paths.first() else {
            return Err(FrameSourceError::EmptySequence(dir.to_path_buf()));
        };
        let first = first.clone();
        let (width, height) = tokio::task::spawn_blocking(move || image::image_dimensions(first))
            .await
            .map_err(|e| FrameSourceError::Io(std::io::Error::other(e)))?
            .map_err(FrameSourceError::Decode)?;
        log!("Replaying {} frames of {width}x{height} from {}", paths.len(), dir.display());
        Ok(Self { pending: paths.into(), resolution: Resolution::new(width, height) })
    }

    pub fn remaining(&self) -> usize { self.pending.len() }
}

#[async_trait]
impl FrameSource for ImageSequenceSource {
    fn resolution(&self) -> Resolution { self.resolution }

    async fn next_frame(&mut self) -> Result<Option<RgbImage>, FrameSourceError> {
        let Some(path) = self.pending.pop_front() else { return Ok(None) };
        let bytes = tokio::fs::read(&path).await.map_err(FrameSourceError::Io)?;
        let frame = image::load_from_memory(&bytes).map_err(FrameSourceError::Decode)?;
        Ok(Some(frame.to_rgb8()))
    }
}

/// Renders a sky/ground split that slowly rolls and pitches.
///
/// # Fields
/// - `resolution`: Size of the rendered frames.
/// - `fov_deg`: Vertical field of view used to place the pitch offset.
/// - `total_frames`: Number of frames before the source is exhausted.
/// - `rendered`: Frames delivered so far.
/// - `noise`: Per channel noise amplitude and its generator.
#[derive(Debug)]
pub struct SyntheticHorizonSource {
    resolution: Resolution,
    fov_deg: f64,
    total_frames: usize,
    rendered: usize,
    noise: Option<(u8, StdRng)>,
}

impl SyntheticHorizonSource {
    const SKY: [u8; 3] = [80, 140, 235];
    const GROUND: [u8; 3] = [70, 90, 50];
    const ROLL_AMPLITUDE_DEG: f64 = 25.0;
    const PITCH_AMPLITUDE_DEG: f64 = 8.0;
    const PERIOD_FRAMES: f64 = 240.0;

    pub fn new(resolution: Resolution, fov_deg: f64, total_frames: usize) -> Self {
        Self { resolution, fov_deg, total_frames, rendered: 0, noise: None }
    }

    /// Adds uniform noise of up to `amplitude` per channel, reproducible through `seed`.
    pub fn with_noise(mut self, amplitude: u8, seed: u64) -> Self {
        self.noise = Some((amplitude, StdRng::seed_from_u64(seed)));
        self
    }

    /// Roll and pitch shown in frame number `index`.
    pub fn attitude_at(index: usize) -> (f64, f64) {
        #[allow(clippy::cast_precision_loss)]
        let phase = index as f64 / Self::PERIOD_FRAMES * std::f64::consts::TAU;
        (Self::ROLL_AMPLITUDE_DEG * phase.sin(), Self::PITCH_AMPLITUDE_DEG * (phase / 2.0).sin())
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn render(&mut self, roll_deg: f64, pitch_deg: f64) -> RgbImage {
        let (width, height) = (self.resolution.width, self.resolution.height);
        let centre = Vec2D::new(f64::from(width) / 2.0, f64::from(height) / 2.0);
        let direction = Vec2D::<f64>::from_angle_deg(roll_deg);
        let normal = Vec2D::<f64>::from_angle_deg(roll_deg + 90.0);
        let anchor = centre + normal * (pitch_deg / self.fov_deg * f64::from(height));

        let mut frame = RgbImage::from_fn(width, height, |x, y| {
            let offset = anchor.to(Vec2D::new(f64::from(x), f64::from(y)));
            if direction.cross(offset) < 0.0 { Rgb(Self::SKY) } else { Rgb(Self::GROUND) }
        });
        if let Some((amplitude, rng)) = self.noise.as_mut() {
            let amplitude = i16::from(*amplitude);
            for pixel in frame.pixels_mut() {
                for channel in &mut pixel.0 {
                    let noisy = i16::from(*channel) + rng.random_range(-amplitude..=amplitude);
                    *channel = noisy.clamp(0, 255) as u8;
                }
            }
        }
        frame
    }
}

#[async_trait]
impl FrameSource for SyntheticHorizonSource {
    fn resolution(&self) -> Resolution { self.resolution }

    async fn next_frame(&mut self) -> Result<Option<RgbImage>, FrameSourceError> {
        if self.rendered >= self.total_frames {
            return Ok(None);
        }
        let (roll, pitch) = Self::attitude_at(self.rendered);
        self.rendered += 1;
        Ok(Some(self.render(roll, pitch)))
    }
}

/// Moves frame acquisition onto its own task.
///
/// Frames are handed over through a bounded channel, so a slow control loop throttles the
/// source instead of piling up frames. The channel closes when the source is exhausted,
/// fails or `c_tok` is cancelled. Undecodable files are skipped.
pub fn spawn_frame_producer(
    mut source: Box<dyn FrameSource>,
    capacity: usize,
    c_tok: CancellationToken,
) -> (mpsc::Receiver<RgbImage>, JoinHandle<usize>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let handle = tokio::spawn(async move {
        let mut delivered = 0;
        loop {
            let next = tokio::select! {
                biased;
                () = c_tok.cancelled() => break,
                next = source.next_frame() => next,
            };
            match next {
                Ok(Some(frame)) => {
                    if tx.send(frame).await.is_err() {
                        break;
                    }
                    delivered += 1;
                }
                Ok(None) => {
                    log!("Frame source exhausted after {delivered} frames");
                    break;
                }
                Err(FrameSourceError::Decode(e)) => warn!("Skipping undecodable frame: {e}"),
                Err(e) => {
                    error!("Frame source failed: {e}");
                    break;
                }
            }
        }
        delivered
    });
    (rx, handle)
}
