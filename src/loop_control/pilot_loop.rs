use super::{
    cycle_timer::CycleTimer,
    loop_context::LoopContext,
    signal::{LoopExitSignal, SwitchEvent},
    switch_monitor::{SwitchMonitor, SwitchTracker},
};
use crate::config::PilotConfig;
use crate::flight_control::{CycleReport, FlightController, ProgramId};
use crate::horizon::HorizonDetector;
use crate::imaging::FrameNormalizer;
use crate::peripherals::{ActuationSink, ReceiverSnapshot};
use crate::recording::{CycleRecord, DiagnosticsRecorder, RecordingMetadata};
use crate::{error, info, prog, warn};
use image::RgbImage;
use std::{path::Path, time::Duration};
use tokio::{sync::mpsc, task::JoinSet, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// One frame in, one command out, once per camera frame period.
///
/// # Fields
/// - `config`: The validated configuration, also written into recordings.
/// - `context`: Loop flags, the shutdown token and counters.
/// - `normalizer`: Crops and scales camera frames for the detector.
/// - `detector`: The horizon detector and its prediction state.
/// - `controller`: The flight controller.
/// - `actuator`: Receives every command.
/// - `recorder`: The running recording, if any.
/// - `finishing`: Recordings switched off and still being flushed.
/// - `tracker`: Derives switch events from the receiver snapshots.
/// - `timer`: Reports the achieved loop rate.
#[derive(Debug)]
pub struct PilotLoop {
    config: PilotConfig,
    context: LoopContext,
    normalizer: FrameNormalizer,
    detector: HorizonDetector,
    controller: FlightController,
    actuator: Box<dyn ActuationSink>,
    recorder: Option<DiagnosticsRecorder>,
    finishing: JoinSet<()>,
    tracker: SwitchTracker,
    timer: CycleTimer,
}

impl PilotLoop {
    pub fn new(config: PilotConfig, actuator: Box<dyn ActuationSink>, c_tok: CancellationToken) -> Self {
        let camera = &config.camera;
        let normalizer = FrameNormalizer::new(camera.inference_resolution);
        let detector = HorizonDetector::new(config.detector.clone(), camera.fov, camera.inference_resolution);
        let controller = FlightController::new(config.controller.clone(), camera.fps);
        let timer = CycleTimer::new(camera.fps);
        Self {
            config,
            context: LoopContext::new(c_tok),
            normalizer,
            detector,
            controller,
            actuator,
            recorder: None,
            finishing: JoinSet::new(),
            tracker: SwitchTracker::default(),
            timer,
        }
    }

    pub fn context(&self) -> &LoopContext { &self.context }

    pub fn controller(&self) -> &FlightController { &self.controller }

    /// Runs cycles until the frames run out or shutdown is requested.
    ///
    /// Shutdown is only checked between cycles, a started cycle always completes. A cycle
    /// that overruns its period delays the following ones instead of being caught up.
    pub async fn run(&mut self, frames: &mut mpsc::Receiver<RgbImage>, monitor: &SwitchMonitor) -> LoopExitSignal {
        let mut interval = tokio::time::interval(Duration::from_secs_f64(self.config.camera.cycle_secs()));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let c_tok = self.context.c_tok().clone();
        loop {
            tokio::select! {
                biased;
                () = c_tok.cancelled() => return LoopExitSignal::Shutdown,
                _ = interval.tick() => (),
            }
            let frame = tokio::select! {
                biased;
                () = c_tok.cancelled() => return LoopExitSignal::Shutdown,
                frame = frames.recv() => frame,
            };
            let Some(frame) = frame else { return LoopExitSignal::EndOfStream };
            self.cycle(&frame, monitor.latest());
        }
    }

    /// Runs one cycle on `frame` with the receiver state `snapshot`.
    pub fn cycle(&mut self, frame: &RgbImage, snapshot: ReceiverSnapshot) -> CycleReport {
        let inference_frame = self.normalizer.normalize(frame);
        let attitude = self.detector.detect(&inference_frame);
        for event in self.tracker.update(&snapshot) {
            self.handle_switch(event);
        }
        let report = self.controller.run(&attitude, snapshot.sticks);
        self.actuator.actuate(report.output);
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.record(CycleRecord::new(&attitude, &report));
        }
        self.context.count_cycle(attitude.is_good);
        self.timer.tick();
        report
    }

    fn handle_switch(&mut self, event: SwitchEvent) {
        prog!("Switch event: {event}");
        let request = match event {
            SwitchEvent::RecordingOn => {
                self.start_recording();
                Some(ProgramId::SurfaceCheck)
            }
            SwitchEvent::RecordingOff => {
                if let Some(recorder) = self.stop_recording() {
                    self.finishing.spawn(Self::finish_recording(recorder));
                }
                Some(ProgramId::QuickWiggle)
            }
            SwitchEvent::AutopilotOn => {
                self.context.set_autopilot(true);
                Some(ProgramId::LevelFlight)
            }
            SwitchEvent::AutopilotOff => {
                self.context.set_autopilot(false);
                (self.controller.active_program() == ProgramId::LevelFlight).then_some(ProgramId::Manual)
            }
        };
        if let Some(id) = request {
            if let Err(e) = self.controller.select_program(id) {
                warn!("Ignoring {event}: {e}");
            }
        }
    }

    fn start_recording(&mut self) {
        if self.recorder.is_some() {
            return;
        }
        let gains = (self.controller.config().aileron_pid, self.controller.config().elevator_pid);
        let metadata = RecordingMetadata::new(&self.config, gains);
        let recording = &self.config.recording;
        self.recorder =
            Some(DiagnosticsRecorder::start(Path::new(&recording.directory), recording.queue_capacity, metadata));
        self.context.set_recording(true);
    }

    fn stop_recording(&mut self) -> Option<DiagnosticsRecorder> {
        self.context.set_recording(false);
        self.recorder.take()
    }

    async fn finish_recording(recorder: DiagnosticsRecorder) {
        if let Err(e) = recorder.finish().await {
            error!("Recording could not be completed: {e}");
        }
    }

    /// Centres the surfaces and completes the running recording and all earlier ones.
    pub async fn shutdown(&mut self, exit: LoopExitSignal) {
        self.actuator.release();
        if let Some(recorder) = self.stop_recording() {
            self.finishing.spawn(Self::finish_recording(recorder));
        }
        while let Some(result) = self.finishing.join_next().await {
            if let Err(e) = result {
                error!("Recording task failed: {e}");
            }
        }
        info!(
            "Control loop stopped ({exit}) after {} cycles, {} with a good horizon",
            self.context.cycles(),
            self.context.good_cycles()
        );
    }
}
