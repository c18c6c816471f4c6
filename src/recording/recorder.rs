use super::{CycleRecord, RecordingMetadata};
use crate::{error, info, warn};
use chrono::Utc;
use std::path::{Path, PathBuf};
use strum_macros::Display;
use tokio::{
    fs::File,
    io::{AsyncWriteExt, BufWriter},
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};

#[derive(Debug, Display)]
pub enum RecorderError {
    Io(std::io::Error),
    Serialize(serde_json::Error),
    Writer(tokio::task::JoinError),
}

impl std::error::Error for RecorderError {}

impl From<std::io::Error> for RecorderError {
    fn from(e: std::io::Error) -> Self { Self::Io(e) }
}

impl From<serde_json::Error> for RecorderError {
    fn from(e: serde_json::Error) -> Self { Self::Serialize(e) }
}

/// Writes cycle records as JSON lines on a background task.
///
/// The control loop only ever hands records over with `try_send`; when storage falls behind
/// the queue fills up and further records are dropped.
///
/// # Fields
/// - `tx`: Queue towards the writer task.
/// - `writer`: The writer task, yielding the number of records written.
/// - `path`: The file being written.
/// - `dropped`: Records lost to a full queue.
#[derive(Debug)]
pub struct DiagnosticsRecorder {
    tx: mpsc::Sender<CycleRecord>,
    writer: JoinHandle<Result<usize, RecorderError>>,
    path: PathBuf,
    dropped: usize,
}

impl DiagnosticsRecorder {
    /// Starts the writer task for `<dir>/<UTC timestamp>.jsonl`.
    ///
    /// The directory and the file are created by the writer, so starting never waits on
    /// storage. If that fails the error is logged, later records are dropped and `finish`
    /// returns the error.
    ///
    /// # Arguments
    /// * `dir` - Recording directory, created if missing.
    /// * `capacity` - Number of records that may be queued for writing.
    /// * `metadata` - Written as the first line.
    pub fn start(dir: &Path, capacity: usize, metadata: RecordingMetadata) -> Self {
        let path = dir.join(format!("{}.jsonl", Utc::now().format("%Y%m%dT%H%M%S%.3fZ")));
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let writer = tokio::spawn(Self::write_records(path.clone(), metadata, rx));
        info!("Recording to {}", path.display());
        Self { tx, writer, path, dropped: 0 }
    }

    pub fn path(&self) -> &Path { &self.path }

    pub fn dropped(&self) -> usize { self.dropped }

    /// Queues `record` without waiting.
    ///
    /// # Returns
    /// `false` if the record was dropped.
    pub fn record(&mut self, record: CycleRecord) -> bool {
        match self.tx.try_send(record) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                warn!("Recording queue full, dropped {} records so far", self.dropped);
                false
            }
            Err(TrySendError::Closed(_)) => {
                self.dropped += 1;
                warn!("Recording writer stopped, record dropped");
                false
            }
        }
    }

    /// Flushes the queue and closes the file.
    ///
    /// # Returns
    /// The number of records written, without the metadata line.
    pub async fn finish(self) -> Result<usize, RecorderError> {
        drop(self.tx);
        let written = self.writer.await.map_err(RecorderError::Writer)??;
        info!("Recorded {written} cycles to {} ({} dropped)", self.path.display(), self.dropped);
        Ok(written)
    }

    async fn write_records(
        path: PathBuf,
        metadata: RecordingMetadata,
        rx: mpsc::Receiver<CycleRecord>,
    ) -> Result<usize, RecorderError> {
        let result = Self::write_file(&path, metadata, rx).await;
        if let Err(e) = &result {
            error!("Recording to {} failed: {e}", path.display());
        }
        result
    }

    async fn write_file(
        path: &Path,
        metadata: RecordingMetadata,
        mut rx: mpsc::Receiver<CycleRecord>,
    ) -> Result<usize, RecorderError> {
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let mut out = BufWriter::new(File::create(path).await?);
        Self::write_line(&mut out, &metadata).await?;
        let mut written = 0;
        while let Some(record) = rx.recv().await {
            Self::write_line(&mut out, &record).await?;
            written += 1;
        }
        out.flush().await?;
        Ok(written)
    }

    async fn write_line<T: serde::Serialize>(out: &mut BufWriter<File>, value: &T) -> Result<(), RecorderError> {
        let mut line = serde_json::to_vec(value)?;
        line.push(b'\n');
        out.write_all(&line).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PilotConfig;
    use crate::flight_control::{ControlOutput, CycleReport, ProgramId, StickInputs, TrimState};
    use crate::horizon::AttitudeSample;
    use rand::Rng;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("horizon-pilot-recording-{}", rand::rng().random::<u64>()))
    }

    fn metadata() -> RecordingMetadata {
        let config = PilotConfig::default();
        let gains = (config.controller.aileron_pid, config.controller.elevator_pid);
        RecordingMetadata::new(&config, gains)
    }

    fn record(aileron: f64) -> CycleRecord {
        let report = CycleReport {
            program: ProgramId::Manual,
            output: ControlOutput::new(aileron, 0.0),
            sticks: StickInputs::new(aileron, 0.0, 0.0),
            trims: TrimState::default(),
        };
        CycleRecord::new(&AttitudeSample::fitted(1.0, 2.0, 0.5, 1.3), &report)
    }

    #[tokio::test]
    async fn test_writes_metadata_and_records() {
        let dir = scratch_dir();
        let mut recorder = DiagnosticsRecorder::start(&dir, 8, metadata());
        let path = recorder.path().to_path_buf();
        for i in 0..3 {
            assert!(recorder.record(record(f64::from(i) / 10.0)));
            tokio::task::yield_now().await;
        }
        assert_eq!(recorder.finish().await.unwrap(), 3);

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        let header: RecordingMetadata = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(header.fps, 30);
        let last: CycleRecord = serde_json::from_str(lines[3]).unwrap();
        assert_eq!(last, record(0.2));
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_unwritable_directory_fails_on_finish() {
        let blocker = scratch_dir();
        tokio::fs::write(&blocker, b"a file, not a directory").await.unwrap();
        let mut recorder = DiagnosticsRecorder::start(&blocker.join("nested"), 4, metadata());
        recorder.record(record(0.0));
        assert!(matches!(recorder.finish().await, Err(RecorderError::Io(_))));
        tokio::fs::remove_file(&blocker).await.unwrap();
    }

    #[tokio::test]
    async fn test_full_queue_drops_instead_of_blocking() {
        let dir = scratch_dir();
        let mut recorder = DiagnosticsRecorder::start(&dir, 1, metadata());
        // the writer cannot run before this task yields, so only the first record fits
        let accepted = (0..5).filter(|_| recorder.record(record(0.0))).count();
        assert_eq!(accepted, 1);
        assert_eq!(recorder.dropped(), 4);
        assert_eq!(recorder.finish().await.unwrap(), 1);
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
