//! Twin configuration

use serde::{Deserialize, Serialize};

use crate::error::TwinError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwinConfig {
    /// V2V radio range (meters).
    pub comm_radius_m: f64,
    /// Steps an absent vehicle is kept; 0 drops it as soon as it is missing.
    pub stale_after_steps: u64,
}

impl Default for TwinConfig {
    fn default() -> Self {
        Self {
            comm_radius_m: 100.0,
            stale_after_steps: 0,
        }
    }
}

impl TwinConfig {
    pub fn validate(&self) -> Result<(), TwinError> {
        if !(self.comm_radius_m.is_finite() && self.comm_radius_m > 0.0) {
            return Err(TwinError::InvalidConfig(format!(
                "comm_radius_m must be positive, got {}",
                self.comm_radius_m
            )));
        }
        Ok(())
    }

    pub fn with_comm_radius(mut self, meters: f64) -> Self {
        self.comm_radius_m = meters;
        self
    }

    pub fn with_stale_after(mut self, steps: u64) -> Self {
        self.stale_after_steps = steps;
        self
    }
}
