//! JSON and SVG files written under the output directory.

use serde::{Deserialize, Serialize};
use shared_types::{TrackSnapshot, V2xMessage};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::domain::{ArchiveSummary, MessageArchive};
use crate::error::MessagingError;

pub const MESSAGES_FILE: &str = "v2x_messages_complete.json";
pub const SUMMARY_FILE: &str = "v2x_summary.json";
pub const STATE_FILE: &str = "pipeline_state.json";
pub const LIVE_VIEW_FILE: &str = "live_view.svg";

/// Messages kept in `pipeline_state.json`.
pub const STATE_RECENT_MESSAGES: usize = 10;

/// Contents of `pipeline_state.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    pub frame_count: u64,
    /// Effective configuration of the run.
    pub config: serde_json::Value,
    pub v2x_messages: Vec<V2xMessage>,
    /// Unix time in seconds.
    pub timestamp: f64,
}

impl PipelineState {
    pub fn capture(frame_count: u64, config: serde_json::Value, archive: &MessageArchive) -> Self {
        Self {
            frame_count,
            config,
            v2x_messages: archive.last_n(STATE_RECENT_MESSAGES).to_vec(),
            timestamp: chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<(), MessagingError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    async fn write_json<T: Serialize + ?Sized>(
        &self,
        name: &str,
        value: &T,
    ) -> Result<PathBuf, MessagingError> {
        let path = self.dir.join(name);
        let body = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(&path, body).await?;
        debug!(path = %path.display(), "Wrote output file");
        Ok(path)
    }

    /// Write the full archive and its summary.
    pub async fn save_archive(
        &self,
        archive: &MessageArchive,
    ) -> Result<ArchiveSummary, MessagingError> {
        self.ensure_dir().await?;
        self.write_json(MESSAGES_FILE, archive.messages()).await?;
        let summary = archive.summary();
        self.write_json(SUMMARY_FILE, &summary).await?;
        info!(
            dir = %self.dir.display(),
            messages = summary.total_messages,
            unique_vehicles = summary.total_unique_vehicles,
            "V2X messages saved"
        );
        Ok(summary)
    }

    /// `tracks_frame_{n}.json`: raw track list at frame `n`.
    pub async fn save_track_state(
        &self,
        frame_count: u64,
        tracks: &[TrackSnapshot],
    ) -> Result<PathBuf, MessagingError> {
        self.ensure_dir().await?;
        self.write_json(&format!("tracks_frame_{frame_count}.json"), tracks)
            .await
    }

    /// `tracks_{frame:06}.json`: the frame's CAM message.
    pub async fn save_frame_tracks(
        &self,
        frame: u64,
        message: &V2xMessage,
    ) -> Result<PathBuf, MessagingError> {
        self.write_json(&format!("tracks_{frame:06}.json"), message)
            .await
    }

    pub async fn save_pipeline_state(&self, state: &PipelineState) -> Result<PathBuf, MessagingError> {
        self.ensure_dir().await?;
        self.write_json(STATE_FILE, state).await
    }

    /// Overwrite the live view.
    pub async fn save_live_view(&self, svg: &str) -> Result<PathBuf, MessagingError> {
        let path = self.dir.join(LIVE_VIEW_FILE);
        tokio::fs::write(&path, svg).await?;
        Ok(path)
    }

    /// `frame_{frame:06}.svg`
    pub async fn save_frame_view(&self, frame: u64, svg: &str) -> Result<PathBuf, MessagingError> {
        let path = self.dir.join(format!("frame_{frame:06}.svg"));
        tokio::fs::write(&path, svg).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{create_broadcast, to_message};
    use shared_types::BoundingBox;

    fn tracks() -> Vec<TrackSnapshot> {
        vec![
            TrackSnapshot::new(1, BoundingBox::new(0.0, 0.0, 4.0, 4.0), 1.0, 1, 2),
            TrackSnapshot::new(2, BoundingBox::new(10.0, 0.0, 14.0, 4.0), 1.0, 0, 2),
        ]
    }

    #[tokio::test]
    async fn test_save_archive_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path().join("results"));
        let mut archive = MessageArchive::new();
        archive.push(create_broadcast(&tracks(), 0.0, None, 300.0));

        let summary = writer.save_archive(&archive).await.unwrap();
        assert_eq!(summary.total_messages, 1);

        let messages: Vec<V2xMessage> = serde_json::from_slice(
            &tokio::fs::read(writer.dir().join(MESSAGES_FILE)).await.unwrap(),
        )
        .unwrap();
        assert_eq!(messages.len(), 1);

        let summary: serde_json::Value = serde_json::from_slice(
            &tokio::fs::read(writer.dir().join(SUMMARY_FILE)).await.unwrap(),
        )
        .unwrap();
        assert_eq!(summary["message_types"]["V2X_BROADCAST"], 1);
        assert_eq!(summary["avg_vehicles_per_message"], 2.0);
    }

    #[tokio::test]
    async fn test_frame_files_named() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path());
        let path = writer
            .save_frame_tracks(7, &to_message(&tracks(), 0.7, true))
            .await
            .unwrap();
        assert!(path.ends_with("tracks_000007.json"));
        let path = writer.save_track_state(12, &tracks()).await.unwrap();
        assert!(path.ends_with("tracks_frame_12.json"));
        let saved: Vec<TrackSnapshot> =
            serde_json::from_slice(&tokio::fs::read(path).await.unwrap()).unwrap();
        assert_eq!(saved.len(), 2);
    }

    #[tokio::test]
    async fn test_pipeline_state_keeps_last_ten() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path());
        let mut archive = MessageArchive::new();
        for i in 0..15 {
            archive.push(to_message(&[], i as f64, false));
        }
        let state = PipelineState::capture(
            15,
            serde_json::json!({ "messaging": { "broadcast_interval": 5 } }),
            &archive,
        );
        assert_eq!(state.v2x_messages.len(), STATE_RECENT_MESSAGES);
        assert!(state.timestamp > 0.0);

        let path = writer.save_pipeline_state(&state).await.unwrap();
        let saved: PipelineState =
            serde_json::from_slice(&tokio::fs::read(path).await.unwrap()).unwrap();
        assert_eq!(saved.frame_count, 15);
        assert_eq!(saved.v2x_messages[0].timestamp, 5.0);
        assert_eq!(saved.config["messaging"]["broadcast_interval"], 5);
    }

    #[tokio::test]
    async fn test_svg_views() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(dir.path());
        writer.save_live_view("<svg/>").await.unwrap();
        let path = writer.save_frame_view(3, "<svg/>").await.unwrap();
        assert!(path.ends_with("frame_000003.svg"));
        assert!(dir.path().join(LIVE_VIEW_FILE).exists());
    }
}
