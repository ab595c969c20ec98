//! JSON-lines trace files: one [`SimulationFrame`] per line.
//!
//! Recording a SUMO run once and replaying it makes pipeline runs
//! reproducible without a simulator installed.

use async_trait::async_trait;
use shared_types::SimulationFrame;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, Lines};
use tracing::{debug, info};

use crate::error::SimulationError;
use crate::ports::VehicleSource;

/// Replays frames from a trace file.
pub struct TraceReplaySource {
    path: PathBuf,
    lines: Option<Lines<BufReader<File>>>,
    line_no: usize,
}

impl TraceReplaySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lines: None,
            line_no: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl VehicleSource for TraceReplaySource {
    async fn start(&mut self) -> Result<(), SimulationError> {
        let file = File::open(&self.path).await?;
        self.lines = Some(BufReader::new(file).lines());
        self.line_no = 0;
        info!(path = %self.path.display(), "Replaying trace");
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Option<SimulationFrame>, SimulationError> {
        let lines = self.lines.as_mut().ok_or(SimulationError::NotStarted)?;
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    return Err(SimulationError::Trace {
                        line: self.line_no + 1,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e.into()),
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            let frame = serde_json::from_str(&line).map_err(|e| SimulationError::Trace {
                line: self.line_no,
                reason: e.to_string(),
            })?;
            return Ok(Some(frame));
        }
        debug!(lines = self.line_no, "Trace exhausted");
        Ok(None)
    }

    async fn close(&mut self) -> Result<(), SimulationError> {
        self.lines = None;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("trace {}", self.path.display())
    }
}

/// Appends frames to a trace file.
pub struct TraceRecorder {
    path: PathBuf,
    writer: BufWriter<File>,
    frames: u64,
}

impl TraceRecorder {
    /// Create (or truncate) the trace file, creating parent directories.
    pub async fn create(path: impl Into<PathBuf>) -> Result<Self, SimulationError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = File::create(&path).await?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            frames: 0,
        })
    }

    pub async fn record(&mut self, frame: &SimulationFrame) -> Result<(), SimulationError> {
        let mut line = serde_json::to_vec(frame).map_err(|e| SimulationError::Trace {
            line: self.frames as usize + 1,
            reason: e.to_string(),
        })?;
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        self.frames += 1;
        Ok(())
    }

    /// Flush buffered frames; returns the number recorded.
    pub async fn finish(mut self) -> Result<u64, SimulationError> {
        self.writer.flush().await?;
        info!(path = %self.path.display(), frames = self.frames, "Trace written");
        Ok(self.frames)
    }
}
