#![allow(dead_code, clippy::similar_names)]
#![warn(clippy::builtin_type_shadow)]
mod common;
mod config;
mod flight_control;
mod horizon;
mod imaging;
mod logger;
mod loop_control;
mod peripherals;
mod recording;

use crate::config::{FRAME_DIR_ENV, PilotConfig};
use crate::imaging::{FrameSource, ImageSequenceSource, SyntheticHorizonSource, spawn_frame_producer};
use crate::loop_control::{PilotLoop, SwitchMonitor};
use crate::peripherals::{LoggingActuator, NeutralReceiver};
use std::{env, path::PathBuf};
use tokio_util::sync::CancellationToken;

#[cfg(all(feature = "profiling", not(target_env = "msvc")))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// Frames buffered between the frame source and the control loop.
const FRAME_QUEUE_CAPACITY: usize = 2;
/// Length of the synthetic flight used when no recorded frames are given.
const SYNTHETIC_FLIGHT_SECS: usize = 60;

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() {
    let config = match PilotConfig::load_from_env() {
        Ok(config) => config,
        Err(e) => fatal!("Invalid configuration: {e}"),
    };
    info!(
        "Starting horizon pilot at {} Hz, inference at {}x{}",
        config.camera.fps, config.camera.inference_resolution.width, config.camera.inference_resolution.height
    );

    let c_tok = CancellationToken::new();
    let shutdown_tok = c_tok.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current cycle");
            shutdown_tok.cancel();
        }
    });

    let source = open_frame_source(&config).await;
    let (mut frames, producer) = spawn_frame_producer(source, FRAME_QUEUE_CAPACITY, c_tok.clone());
    let monitor = SwitchMonitor::start(Box::new(NeutralReceiver), SwitchMonitor::POLL_INTERVAL, &c_tok);

    let mut pilot = PilotLoop::new(config, Box::new(LoggingActuator::default()), c_tok.clone());
    let exit = pilot.run(&mut frames, &monitor).await;
    pilot.shutdown(exit).await;

    c_tok.cancel();
    drop(frames);
    monitor.stop().await;
    if let Ok(delivered) = producer.await {
        log!("Frame source delivered {delivered} frames");
    }
}

/// Replays the frames in [`FRAME_DIR_ENV`] if set, renders a synthetic flight otherwise.
async fn open_frame_source(config: &PilotConfig) -> Box<dyn FrameSource> {
    if let Ok(dir) = env::var(FRAME_DIR_ENV) {
        match ImageSequenceSource::open(&PathBuf::from(&dir)).await {
            Ok(source) => return Box::new(source),
            Err(e) => fatal!("Cannot replay frames from {dir}: {e}"),
        }
    }
    info!("{FRAME_DIR_ENV} not set, flying a synthetic horizon");
    let frames = SYNTHETIC_FLIGHT_SECS * config.camera.fps as usize;
    Box::new(SyntheticHorizonSource::new(config.camera.resolution, config.camera.fov, frames))
}
