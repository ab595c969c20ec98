//! SUMO-backed vehicle source.

use async_trait::async_trait;
use shared_types::{SimulationFrame, VehicleState};
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::adapters::traci_client::TraciClient;
use crate::domain::SumoConfig;
use crate::error::SimulationError;
use crate::ports::VehicleSource;

/// Drives a SUMO instance one step per frame.
///
/// With `launch` set, the simulator is spawned as a child process and
/// killed on [`VehicleSource::close`] (or when the runner is dropped).
pub struct SumoRunner {
    config: SumoConfig,
    client: Option<TraciClient>,
    child: Option<Child>,
    step: u64,
    finished: bool,
}

impl SumoRunner {
    pub fn new(config: SumoConfig) -> Self {
        Self {
            config,
            client: None,
            child: None,
            step: 0,
            finished: false,
        }
    }

    pub fn config(&self) -> &SumoConfig {
        &self.config
    }

    fn spawn_simulator(&mut self) -> Result<(), SimulationError> {
        let binary = self.config.binary().to_string();
        let args = self.config.launch_args();
        info!(binary = %binary, args = ?args, "Launching SUMO");

        let child = Command::new(&binary)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SimulationError::Launch(format!("{binary}: {e}")))?;
        self.child = Some(child);
        Ok(())
    }

    /// Read every vehicle of the current step.
    async fn read_vehicles(
        client: &mut TraciClient,
    ) -> Result<Vec<VehicleState>, SimulationError> {
        let ids = client.vehicle_ids().await?;
        let mut vehicles = Vec::with_capacity(ids.len());
        for id in ids {
            let (x, y) = client.position(&id).await?;
            let speed = client.speed(&id).await?;
            let angle = client.angle(&id).await?;
            let mut state = VehicleState::new(id.as_str(), x, y, speed, angle);
            state.vehicle_class = non_empty(client.vehicle_class(&id).await?);
            state.road_id = non_empty(client.road_id(&id).await?);
            state.lane_id = non_empty(client.lane_id(&id).await?);
            state.acceleration = client.acceleration(&id).await?;
            vehicles.push(state);
        }
        Ok(vehicles)
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[async_trait]
impl VehicleSource for SumoRunner {
    async fn start(&mut self) -> Result<(), SimulationError> {
        self.config.validate()?;
        if self.config.launch {
            self.spawn_simulator()?;
        }

        let addr = self.config.address();
        let mut client = TraciClient::connect_with_retry(
            &addr,
            self.config.connect_attempts,
            self.config.retry_delay(),
        )
        .await?;

        let (api, identifier) = client.get_version().await?;
        info!(addr = %addr, api, server = %identifier, "TraCI session established");

        self.client = Some(client);
        self.step = 0;
        self.finished = false;
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Option<SimulationFrame>, SimulationError> {
        if self.finished {
            return Ok(None);
        }
        let client = self.client.as_mut().ok_or(SimulationError::NotStarted)?;

        client.simulation_step(0.0).await?;
        let time_s = client.sim_time().await?;
        let vehicles = Self::read_vehicles(client).await?;
        let frame = SimulationFrame::new(self.step, time_s, vehicles);
        self.step += 1;

        let expected = client.min_expected_vehicles().await?;
        if expected <= 0 {
            debug!(step = frame.step, "No more vehicles expected");
            self.finished = true;
        }
        Ok(Some(frame))
    }

    async fn close(&mut self) -> Result<(), SimulationError> {
        let mut result = Ok(());
        if let Some(mut client) = self.client.take() {
            if let Err(e) = client.close().await {
                warn!(error = %e, "TraCI close failed");
                result = Err(e);
            }
        }
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                warn!(error = %e, "Failed to stop SUMO process");
            }
        }
        result
    }

    fn describe(&self) -> String {
        match (&self.config.sumocfg, self.config.launch) {
            (Some(cfg), true) => format!("{} -c {}", self.config.binary(), cfg.display()),
            _ => format!("TraCI {}", self.config.address()),
        }
    }
}
