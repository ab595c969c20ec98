//! # V2X Pipeline
//!
//! Drives one run, frame by frame:
//!
//! ```text
//! VehicleSource ─→ detect ─→ track ─→ twin ─→ (every N frames) broadcast
//!       │             │         │        │              │
//!       └─────────────┴─────────┴────────┴──────────────┴──→ Event Bus
//! ```
//!
//! The run stops when the source is exhausted, the frame limit is reached,
//! or the shutdown signal flips to `true`. Cleanup runs in every case.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use shared_bus::{EventPublisher, InMemoryEventBus, V2xEvent};
use shared_types::{SimulationFrame, SubsystemId, TrackSnapshot};
use v2x_telemetry::{HistogramTimer, FRAME_DURATION};
use vx_01_simulation::{SimulationError, TraceRecorder, VehicleSource};
use vx_02_perception::{DetectionApi, PerceptionError};
use vx_03_tracking::{TrackingApi, TrackingError};
use vx_04_digital_twin::{render_svg, DigitalTwinApi, TwinSnapshot};
use vx_05_messaging::{
    create_broadcast, to_message, BroadcastTransport, MessageArchive, MessagingError,
    OutputWriter, PipelineState,
};

use crate::container::{NodeConfig, SubsystemContainer};

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Simulation error: {0}")]
    Simulation(#[from] SimulationError),

    #[error("Perception error: {0}")]
    Perception(#[from] PerceptionError),

    #[error("Tracking error: {0}")]
    Tracking(#[from] TrackingError),

    #[error("Messaging error: {0}")]
    Messaging(#[from] MessagingError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    SimulationEnded,
    FrameLimit,
    Shutdown,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SimulationEnded => "simulation ended",
            Self::FrameLimit => "frame limit reached",
            Self::Shutdown => "shutdown requested",
        })
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub frames: u64,
    pub messages: usize,
    pub end_reason: EndReason,
}

pub struct V2xPipeline {
    config: NodeConfig,
    subsystems: SubsystemContainer,
    source: Box<dyn VehicleSource>,
    transport: Arc<dyn BroadcastTransport>,
    bus: Arc<InMemoryEventBus>,
    writer: OutputWriter,
    recorder: Option<TraceRecorder>,
    archive: MessageArchive,
    last_tracks: Vec<TrackSnapshot>,
    frame_count: u64,
    last_step: u64,
}

impl V2xPipeline {
    pub fn new(
        config: NodeConfig,
        subsystems: SubsystemContainer,
        source: Box<dyn VehicleSource>,
        transport: Arc<dyn BroadcastTransport>,
        bus: Arc<InMemoryEventBus>,
    ) -> Self {
        let writer = OutputWriter::new(config.output.output_dir.clone());
        Self {
            config,
            subsystems,
            source,
            transport,
            bus,
            writer,
            recorder: None,
            archive: MessageArchive::new(),
            last_tracks: Vec::new(),
            frame_count: 0,
            last_step: 0,
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Frames fully processed so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn archive(&self) -> &MessageArchive {
        &self.archive
    }

    pub fn subsystems(&self) -> &SubsystemContainer {
        &self.subsystems
    }

    /// Run until the source ends, the frame limit or `shutdown` is `true`.
    pub async fn run(
        &mut self,
        shutdown: watch::Receiver<bool>,
    ) -> Result<RunReport, PipelineError> {
        info!(
            source = %self.source.describe(),
            transport = %self.transport.describe(),
            output_dir = %self.config.output.output_dir.display(),
            max_frames = self.config.output.max_frames,
            "Starting V2X pipeline"
        );

        let outcome = self.drive(&shutdown).await;
        let reason = match &outcome {
            Ok(reason) => reason.to_string(),
            Err(e) => {
                self.report_error(subsystem_of(e), e).await;
                format!("error: {e}")
            }
        };
        let cleanup = self.cleanup(&reason).await;

        let end_reason = outcome?;
        cleanup?;

        let report = RunReport {
            frames: self.frame_count,
            messages: self.archive.len(),
            end_reason,
        };
        info!(
            frames = report.frames,
            messages = report.messages,
            reason = %report.end_reason,
            "Pipeline completed"
        );
        Ok(report)
    }

    async fn drive(&mut self, shutdown: &watch::Receiver<bool>) -> Result<EndReason, PipelineError> {
        self.ensure_output().await?;
        self.source.start().await?;

        loop {
            // Checked between frames so a TraCI exchange is never cut in half
            if *shutdown.borrow() {
                info!(frame = self.frame_count, "Shutdown signal received");
                return Ok(EndReason::Shutdown);
            }
            let limit = self.config.output.max_frames;
            if limit > 0 && self.frame_count >= limit {
                info!(frames = self.frame_count, "Reached frame limit");
                return Ok(EndReason::FrameLimit);
            }

            let frame = {
                let _timer = HistogramTimer::stage("simulation");
                self.source.next_frame().await
            };
            let Some(frame) = frame? else {
                info!(frames = self.frame_count, "Simulation completed");
                return Ok(EndReason::SimulationEnded);
            };

            self.process_frame(&frame).await?;
            self.frame_count += 1;
        }
    }

    async fn ensure_output(&mut self) -> Result<(), PipelineError> {
        self.writer.ensure_dir().await?;
        if let Some(path) = &self.config.simulation.record_file {
            self.recorder = Some(TraceRecorder::create(path.clone()).await?);
        }
        Ok(())
    }

    async fn process_frame(&mut self, frame: &SimulationFrame) -> Result<(), PipelineError> {
        let _frame_timer = HistogramTimer::new(&FRAME_DURATION);
        let frame_no = self.frame_count;
        self.last_step = frame.step;

        self.bus
            .publish(V2xEvent::FrameCaptured {
                step: frame.step,
                time_s: frame.time_s,
                vehicle_count: frame.vehicles.len(),
            })
            .await;
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.record(frame).await?;
        }

        let detections = {
            let _timer = HistogramTimer::stage("perception");
            self.subsystems.perception.detect(frame)?
        };
        self.bus
            .publish(V2xEvent::DetectionsProduced {
                step: frame.step,
                count: detections.len(),
            })
            .await;

        let tracks = {
            let _timer = HistogramTimer::stage("tracking");
            let projector = self.subsystems.perception.projector();
            self.subsystems
                .tracking
                .update(&detections, &frame.vehicles, projector)?
        };
        self.bus
            .publish(V2xEvent::TracksUpdated {
                frame: frame_no,
                tracks: tracks.clone(),
            })
            .await;

        let snapshot = {
            let _timer = HistogramTimer::stage("twin");
            self.subsystems.twin.apply_frame(frame)
        };
        self.bus
            .publish(V2xEvent::TwinUpdated {
                step: frame.step,
                vehicles: snapshot.nodes.len(),
                links: snapshot.links.len(),
            })
            .await;

        if self.config.messaging.is_broadcast_frame(frame_no) {
            let _timer = HistogramTimer::stage("messaging");
            self.broadcast(&tracks, frame).await;
        }

        info!(
            frame = frame_no,
            step = frame.step,
            time_s = frame.time_s,
            vehicles = frame.vehicles.len(),
            tracks = tracks.len(),
            links = snapshot.links.len(),
            "Frame processed"
        );

        if self.config.output.save_output {
            let message = to_message(&tracks, frame.time_s, true);
            self.writer.save_frame_tracks(frame_no, &message).await?;
        }
        self.write_views(frame_no, &snapshot).await?;

        self.last_tracks = tracks;
        Ok(())
    }

    async fn broadcast(&mut self, tracks: &[TrackSnapshot], frame: &SimulationFrame) {
        let messaging = &self.config.messaging;
        let mut message = create_broadcast(
            tracks,
            frame.time_s,
            messaging.ego_vehicle_id.as_ref(),
            messaging.v2x_range_m,
        );
        message.pipeline_frame = Some(self.frame_count);

        // Transmission failures are reported but do not stop the run
        if let Err(e) = self.transport.send(&message).await {
            warn!(error = %e, transport = %self.transport.describe(), "Broadcast transmission failed");
            self.bus
                .publish(V2xEvent::CriticalError {
                    subsystem_id: SubsystemId::Messaging,
                    error: e.to_string(),
                })
                .await;
        }

        info!(
            frame = self.frame_count,
            vehicles = message.total_vehicles,
            nearby = message.nearby_vehicles.as_ref().map_or(0, Vec::len),
            "V2X broadcast"
        );
        self.archive.push(message.clone());
        self.bus.publish(V2xEvent::MessageBroadcast(message)).await;
    }

    async fn write_views(&self, frame_no: u64, snapshot: &TwinSnapshot) -> Result<(), PipelineError> {
        let output = &self.config.output;
        if !(output.show_visualization || output.save_frames) {
            return Ok(());
        }
        let projector = self.subsystems.perception.projector();
        let bounds = projector
            .bounds()
            .or_else(|| snapshot.bounds(self.config.perception.bounds_margin_m));
        let Some(bounds) = bounds.filter(|b| b.is_valid()) else {
            debug!(frame = frame_no, "No world bounds yet, view skipped");
            return Ok(());
        };

        let svg = render_svg(snapshot, &bounds, projector.image_size());
        if output.show_visualization {
            self.writer.save_live_view(&svg).await?;
        }
        if output.save_frames {
            self.writer.save_frame_view(frame_no, &svg).await?;
        }
        Ok(())
    }

    /// Persist results and release the source; every step is attempted.
    async fn cleanup(&mut self, reason: &str) -> Result<(), PipelineError> {
        info!("Saving results...");
        let mut first_error: Option<PipelineError> = None;
        let mut keep = |result: Result<(), PipelineError>, what: &str| {
            if let Err(e) = result {
                warn!(error = %e, "Cleanup step failed: {what}");
                first_error.get_or_insert(e);
            }
        };

        if self.config.output.save_v2x_messages && !self.archive.is_empty() {
            keep(
                self.writer
                    .save_archive(&self.archive)
                    .await
                    .map(|_| ())
                    .map_err(Into::into),
                "message archive",
            );
        }
        if self.config.output.save_output {
            keep(
                self.writer
                    .save_track_state(self.frame_count, &self.last_tracks)
                    .await
                    .map(|_| ())
                    .map_err(Into::into),
                "track snapshot",
            );
        }
        let state = serde_json::to_value(&self.config)
            .map(|config| PipelineState::capture(self.frame_count, config, &self.archive));
        match state {
            Ok(state) => keep(
                self.writer
                    .save_pipeline_state(&state)
                    .await
                    .map(|_| ())
                    .map_err(Into::into),
                "pipeline state",
            ),
            Err(e) => keep(Err(e.into()), "pipeline state"),
        }

        if let Some(recorder) = self.recorder.take() {
            keep(
                recorder
                    .finish()
                    .await
                    .map(|frames| debug!(frames, "Trace recorded"))
                    .map_err(Into::into),
                "trace recording",
            );
        }
        keep(self.source.close().await.map_err(Into::into), "source close");

        self.bus
            .publish(V2xEvent::SimulationEnded {
                step: self.last_step,
                reason: reason.to_string(),
            })
            .await;

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn report_error(&self, subsystem_id: SubsystemId, error: &PipelineError) {
        self.bus
            .publish(V2xEvent::CriticalError {
                subsystem_id,
                error: error.to_string(),
            })
            .await;
    }
}

fn subsystem_of(error: &PipelineError) -> SubsystemId {
    match error {
        PipelineError::Simulation(_) => SubsystemId::Simulation,
        PipelineError::Perception(_) => SubsystemId::Perception,
        PipelineError::Tracking(_) => SubsystemId::Tracking,
        PipelineError::Messaging(_) => SubsystemId::Messaging,
        PipelineError::Serialization(_) => SubsystemId::Runtime,
    }
}
