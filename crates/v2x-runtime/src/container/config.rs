//! # Node Configuration
//!
//! Unified configuration for every subsystem and the run itself.
//!
//! Sources are applied in order, each overriding the previous one:
//!
//! 1. built-in defaults
//! 2. the TOML settings file (`--settings`)
//! 3. environment variables (`V2X_*`)
//! 4. command-line flags

use serde::{Deserialize, Serialize};
use shared_types::{ImageSize, VehicleId};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use vx_01_simulation::SumoConfig;
use vx_02_perception::PerceptionConfig;
use vx_03_tracking::TrackerConfig;
use vx_04_digital_twin::TwinConfig;
use vx_05_messaging::MessagingConfig;

/// Rendered view and detection frame size used by the runtime.
pub const RUNTIME_IMAGE_SIZE: ImageSize = ImageSize {
    width: 1200,
    height: 800,
};

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub simulation: SimulationSettings,
    pub perception: PerceptionConfig,
    pub tracking: TrackerConfig,
    pub twin: TwinConfig,
    pub messaging: MessagingConfig,
    pub output: OutputConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationSettings::default(),
            perception: PerceptionConfig::default().with_image_size(RUNTIME_IMAGE_SIZE),
            tracking: TrackerConfig::default(),
            twin: TwinConfig::default(),
            messaging: MessagingConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Where frames come from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    #[serde(flatten)]
    pub sumo: SumoConfig,
    /// Replay this trace instead of talking to SUMO.
    pub trace_file: Option<PathBuf>,
    /// Record every frame of the run to this trace.
    pub record_file: Option<PathBuf>,
}

/// What the run writes and when it stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Per-frame `tracks_{frame}.json` and the final track snapshot.
    pub save_output: bool,
    pub output_dir: PathBuf,
    /// Keep `live_view.svg` up to date.
    pub show_visualization: bool,
    /// One SVG per frame.
    pub save_frames: bool,
    pub save_v2x_messages: bool,
    /// 0 runs until the simulation ends.
    pub max_frames: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            save_output: true,
            output_dir: PathBuf::from("./v2x_results/"),
            show_visualization: true,
            save_frames: false,
            save_v2x_messages: true,
            max_frames: 1000,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid {section} configuration: {reason}")]
    Invalid {
        section: &'static str,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(section: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Invalid {
            section,
            reason: err.to_string(),
        }
    }
}

/// Overrides taken from the command line; `None`/`false` leaves a value alone.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub sumocfg: Option<PathBuf>,
    pub gui: bool,
    pub no_viz: bool,
    pub output_dir: Option<PathBuf>,
    pub trace_file: Option<PathBuf>,
    pub record_file: Option<PathBuf>,
    pub max_frames: Option<u64>,
}

impl NodeConfig {
    /// Parse a TOML settings document; missing keys keep their defaults.
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text, path)?;
        info!(path = %path.display(), "Loaded settings file");
        Ok(config)
    }

    /// Apply `V2X_*` variables from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply `V2X_*` variables from `lookup`; unparsable numbers are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("V2X_SUMOCFG") {
            self.simulation.sumo.sumocfg = Some(PathBuf::from(path));
        }
        if let Some(dir) = lookup("V2X_OUTPUT_DIR") {
            self.output.output_dir = PathBuf::from(dir);
        }
        if let Some(ego) = lookup("V2X_EGO_VEHICLE") {
            self.messaging.ego_vehicle_id = Some(VehicleId::new(ego));
        }
        if let Some(port) = lookup("V2X_TRACI_PORT") {
            match port.parse() {
                Ok(p) => self.simulation.sumo.port = p,
                Err(_) => warn!(value = %port, "Ignoring invalid V2X_TRACI_PORT"),
            }
        }
        if let Some(frames) = lookup("V2X_MAX_FRAMES") {
            match frames.parse() {
                Ok(n) => self.output.max_frames = n,
                Err(_) => warn!(value = %frames, "Ignoring invalid V2X_MAX_FRAMES"),
            }
        }
    }

    pub fn apply_cli(&mut self, cli: &CliOverrides) {
        if let Some(path) = &cli.sumocfg {
            self.simulation.sumo.sumocfg = Some(path.clone());
        }
        if cli.gui {
            self.simulation.sumo.use_gui = true;
        }
        if cli.no_viz {
            self.output.show_visualization = false;
            self.output.save_frames = false;
        }
        if let Some(dir) = &cli.output_dir {
            self.output.output_dir = dir.clone();
        }
        if let Some(trace) = &cli.trace_file {
            self.simulation.trace_file = Some(trace.clone());
        }
        if let Some(record) = &cli.record_file {
            self.simulation.record_file = Some(record.clone());
        }
        if let Some(max) = cli.max_frames {
            self.output.max_frames = max;
        }
    }

    /// Defaults, then `settings`, then the environment, then `cli`.
    pub fn load(settings: Option<&Path>, cli: &CliOverrides) -> Result<Self, ConfigError> {
        let mut config = match settings {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Tracker settings aligned with the simulator step.
    pub fn effective_tracking(&self) -> TrackerConfig {
        self.tracking
            .clone()
            .with_step_length(self.simulation.sumo.step_length)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sumo = &self.simulation.sumo;
        if !(sumo.step_length.is_finite() && sumo.step_length > 0.0) {
            return Err(ConfigError::invalid(
                "simulation",
                format!("step_length must be positive, got {}", sumo.step_length),
            ));
        }
        // A replayed trace never touches SUMO
        if self.simulation.trace_file.is_none() {
            sumo.validate()
                .map_err(|e| ConfigError::invalid("simulation", e))?;
        }
        self.perception
            .validate()
            .map_err(|e| ConfigError::invalid("perception", e))?;
        self.effective_tracking()
            .validate()
            .map_err(|e| ConfigError::invalid("tracking", e))?;
        self.twin
            .validate()
            .map_err(|e| ConfigError::invalid("twin", e))?;
        self.messaging
            .validate()
            .map_err(|e| ConfigError::invalid("messaging", e))?;
        if self.output.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::invalid("output", "output_dir is empty"));
        }
        Ok(())
    }
}
