//! Simulator connection settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::SimulationError;

/// Default TraCI port SUMO listens on.
pub const DEFAULT_TRACI_PORT: u16 = 8813;

/// How to reach (and optionally launch) SUMO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SumoConfig {
    /// `.sumocfg` scenario; required when `launch` is set.
    pub sumocfg: Option<PathBuf>,
    /// Binary used when `use_gui` is off.
    pub sumo_binary: String,
    /// Simulation step length in seconds.
    pub step_length: f64,
    /// Launch `sumo-gui` instead of `sumo_binary`.
    pub use_gui: bool,
    pub host: String,
    pub port: u16,
    /// Spawn the simulator ourselves; otherwise attach to a running one.
    pub launch: bool,
    pub connect_attempts: u32,
    /// Pause between connection attempts, in milliseconds.
    pub connect_retry_ms: u64,
}

impl Default for SumoConfig {
    fn default() -> Self {
        Self {
            sumocfg: None,
            sumo_binary: "sumo".to_string(),
            step_length: 0.1,
            use_gui: false,
            host: "127.0.0.1".to_string(),
            port: DEFAULT_TRACI_PORT,
            launch: true,
            connect_attempts: 20,
            connect_retry_ms: 250,
        }
    }
}

impl SumoConfig {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !(self.step_length.is_finite() && self.step_length > 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "step_length must be positive, got {}",
                self.step_length
            )));
        }
        if self.connect_attempts == 0 {
            return Err(SimulationError::InvalidConfig(
                "connect_attempts cannot be 0".to_string(),
            ));
        }
        if self.launch {
            match &self.sumocfg {
                None => {
                    return Err(SimulationError::InvalidConfig(
                        "sumocfg is required when launching SUMO".to_string(),
                    ))
                }
                Some(cfg) if !cfg.exists() => {
                    return Err(SimulationError::InvalidConfig(format!(
                        "sumocfg {} does not exist",
                        cfg.display()
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Binary actually launched.
    pub fn binary(&self) -> &str {
        if self.use_gui {
            "sumo-gui"
        } else {
            &self.sumo_binary
        }
    }

    /// Command-line arguments passed to the simulator.
    pub fn launch_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(cfg) = &self.sumocfg {
            args.push("-c".to_string());
            args.push(cfg.display().to_string());
        }
        args.push("--step-length".to_string());
        args.push(self.step_length.to_string());
        args.push("--start".to_string());
        args.push("--remote-port".to_string());
        args.push(self.port.to_string());
        args
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.connect_retry_ms)
    }

    /// Builder-style method to set the scenario file.
    pub fn with_sumocfg(mut self, path: impl Into<PathBuf>) -> Self {
        self.sumocfg = Some(path.into());
        self
    }

    /// Builder-style method to attach to an already running simulator.
    pub fn attach_to(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self.launch = false;
        self
    }

    pub fn with_gui(mut self, use_gui: bool) -> Self {
        self.use_gui = use_gui;
        self
    }

    pub fn with_step_length(mut self, seconds: f64) -> Self {
        self.step_length = seconds;
        self
    }
}
