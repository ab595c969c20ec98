//! # Subsystem Container
//!
//! Holds the stateful per-frame subsystems, built in stage order:
//!
//! ```text
//! Perception (vx-02) ─→ Tracking (vx-03) ─→ Digital Twin (vx-04)
//! ```
//!
//! The vehicle feed and the broadcast transport are I/O adapters and are
//! built separately (see `adapters`).

use tracing::info;

use vx_02_perception::DetectionService;
use vx_03_tracking::EnhancedTracker;
use vx_04_digital_twin::DigitalTwin;

use crate::container::config::{ConfigError, NodeConfig};

pub struct SubsystemContainer {
    /// Projection and ground-truth detections (Subsystem 2).
    pub perception: DetectionService,
    /// ByteTrack with simulator enrichment (Subsystem 3).
    pub tracking: EnhancedTracker,
    /// Vehicle twin and communication graph (Subsystem 4).
    pub twin: DigitalTwin,
}

impl SubsystemContainer {
    pub fn new(config: &NodeConfig) -> Result<Self, ConfigError> {
        let perception = DetectionService::new(config.perception.clone()).map_err(|e| {
            ConfigError::Invalid {
                section: "perception",
                reason: e.to_string(),
            }
        })?;
        let tracking_config = config.effective_tracking();
        let frame_rate = tracking_config.frame_rate;
        let tracking = EnhancedTracker::new(tracking_config).map_err(|e| ConfigError::Invalid {
            section: "tracking",
            reason: e.to_string(),
        })?;
        let twin = DigitalTwin::new(config.twin.clone()).map_err(|e| ConfigError::Invalid {
            section: "twin",
            reason: e.to_string(),
        })?;

        info!(
            mode = ?config.perception.detection_mode,
            frame_rate,
            comm_radius_m = config.twin.comm_radius_m,
            "Subsystems initialized"
        );
        Ok(Self {
            perception,
            tracking,
            twin,
        })
    }
}
