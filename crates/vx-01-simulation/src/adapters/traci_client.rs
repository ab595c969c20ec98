//! Async TraCI client over TCP.

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::domain::protocol::{self, Command, TraciValue, VariableResponse};
use crate::error::SimulationError;

/// Replies larger than this are treated as corrupt.
const MAX_REPLY_LEN: usize = 64 * 1024 * 1024;

/// A connected TraCI session.
///
/// Requests are strictly sequential: each call writes one message and
/// reads exactly one reply.
#[derive(Debug)]
pub struct TraciClient {
    stream: TcpStream,
}

impl TraciClient {
    /// Connect once.
    pub async fn connect(addr: &str) -> Result<Self, SimulationError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }

    /// Connect, retrying while the simulator is still starting up.
    pub async fn connect_with_retry(
        addr: &str,
        attempts: u32,
        delay: Duration,
    ) -> Result<Self, SimulationError> {
        for attempt in 1..=attempts {
            match Self::connect(addr).await {
                Ok(client) => {
                    debug!(addr, attempt, "Connected to TraCI server");
                    return Ok(client);
                }
                Err(e) => {
                    debug!(addr, attempt, error = %e, "TraCI connect failed");
                    if attempt < attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
        Err(SimulationError::Connect {
            addr: addr.to_string(),
            attempts,
        })
    }

    /// Send one command and return the reply payload following an OK status.
    async fn exchange(&mut self, command: Command) -> Result<Vec<u8>, SimulationError> {
        let message = protocol::encode_message(std::slice::from_ref(&command));
        self.stream.write_all(&message).await?;

        let total = self.stream.read_u32().await? as usize;
        if !(4..=MAX_REPLY_LEN).contains(&total) {
            return Err(SimulationError::protocol(format!(
                "invalid reply length {total}"
            )));
        }
        let mut body = vec![0u8; total - 4];
        self.stream.read_exact(&mut body).await?;

        let (status, rest) = protocol::split_reply(&body)?;
        if status.command != command.id {
            return Err(SimulationError::protocol(format!(
                "status for 0x{:02x} in reply to 0x{:02x}",
                status.command, command.id
            )));
        }
        status.into_result()?;
        Ok(rest.to_vec())
    }

    /// Issue a get-variable command and decode its typed value.
    async fn get_variable(
        &mut self,
        command: u8,
        response: u8,
        variable: u8,
        object_id: &str,
    ) -> Result<TraciValue, SimulationError> {
        let payload = self
            .exchange(Command::get_variable(command, variable, object_id))
            .await?;
        let commands = protocol::decode_commands(&payload)?;
        let Some(reply) = commands.first() else {
            return Err(SimulationError::protocol("missing variable response"));
        };
        if reply.id != response {
            return Err(SimulationError::protocol(format!(
                "expected response 0x{response:02x}, got 0x{:02x}",
                reply.id
            )));
        }
        let parsed = VariableResponse::parse(reply)?;
        if parsed.variable != variable || parsed.object_id != object_id {
            return Err(SimulationError::protocol(format!(
                "response for 0x{:02x}/{} while asking 0x{variable:02x}/{object_id}",
                parsed.variable, parsed.object_id
            )));
        }
        Ok(parsed.value)
    }

    async fn vehicle_variable(
        &mut self,
        variable: u8,
        vehicle_id: &str,
    ) -> Result<TraciValue, SimulationError> {
        self.get_variable(
            protocol::CMD_GET_VEHICLE_VARIABLE,
            protocol::RESPONSE_GET_VEHICLE_VARIABLE,
            variable,
            vehicle_id,
        )
        .await
    }

    async fn sim_variable(&mut self, variable: u8) -> Result<TraciValue, SimulationError> {
        self.get_variable(
            protocol::CMD_GET_SIM_VARIABLE,
            protocol::RESPONSE_GET_SIM_VARIABLE,
            variable,
            "",
        )
        .await
    }

    // =========================================================================
    // CONTROL
    // =========================================================================

    /// API version and server identifier.
    pub async fn get_version(&mut self) -> Result<(i32, String), SimulationError> {
        let payload = self
            .exchange(Command::new(protocol::CMD_GET_VERSION))
            .await?;
        let commands = protocol::decode_commands(&payload)?;
        let Some(reply) = commands.first() else {
            return Err(SimulationError::protocol("missing version response"));
        };
        let mut reader = protocol::Reader::new(&reply.content);
        let api = reader.read_i32()?;
        let identifier = reader.read_string()?;
        Ok((api, identifier))
    }

    /// Advance the simulation; `target_time = 0.0` performs exactly one step.
    pub async fn simulation_step(&mut self, target_time: f64) -> Result<(), SimulationError> {
        let payload = self
            .exchange(Command::new(protocol::CMD_SIMSTEP).put_f64(target_time))
            .await?;
        if payload.len() >= 4 {
            let subscriptions = protocol::Reader::new(&payload).read_i32()?;
            if subscriptions > 0 {
                warn!(subscriptions, "Ignoring subscription results");
            }
        }
        Ok(())
    }

    /// Ask the server to end the session.
    pub async fn close(&mut self) -> Result<(), SimulationError> {
        self.exchange(Command::new(protocol::CMD_CLOSE)).await?;
        self.stream.shutdown().await?;
        Ok(())
    }

    // =========================================================================
    // SIMULATION VARIABLES
    // =========================================================================

    /// Current simulation time in seconds.
    pub async fn sim_time(&mut self) -> Result<f64, SimulationError> {
        expect_double(self.sim_variable(protocol::VAR_TIME).await?)
    }

    /// Vehicles still running or waiting to depart.
    pub async fn min_expected_vehicles(&mut self) -> Result<i32, SimulationError> {
        expect_int(
            self.sim_variable(protocol::VAR_MIN_EXPECTED_VEHICLES)
                .await?,
        )
    }

    // =========================================================================
    // VEHICLE VARIABLES
    // =========================================================================

    pub async fn vehicle_ids(&mut self) -> Result<Vec<String>, SimulationError> {
        match self.vehicle_variable(protocol::ID_LIST, "").await? {
            TraciValue::StringList(ids) => Ok(ids),
            other => Err(type_mismatch("stringlist", &other)),
        }
    }

    /// World position `(x, y)` in meters.
    pub async fn position(&mut self, vehicle_id: &str) -> Result<(f64, f64), SimulationError> {
        match self
            .vehicle_variable(protocol::VAR_POSITION, vehicle_id)
            .await?
        {
            TraciValue::Position2D(x, y) => Ok((x, y)),
            other => Err(type_mismatch("position2d", &other)),
        }
    }

    pub async fn speed(&mut self, vehicle_id: &str) -> Result<f64, SimulationError> {
        expect_double(self.vehicle_variable(protocol::VAR_SPEED, vehicle_id).await?)
    }

    pub async fn angle(&mut self, vehicle_id: &str) -> Result<f64, SimulationError> {
        expect_double(self.vehicle_variable(protocol::VAR_ANGLE, vehicle_id).await?)
    }

    pub async fn acceleration(&mut self, vehicle_id: &str) -> Result<f64, SimulationError> {
        expect_double(
            self.vehicle_variable(protocol::VAR_ACCELERATION, vehicle_id)
                .await?,
        )
    }

    pub async fn vehicle_class(&mut self, vehicle_id: &str) -> Result<String, SimulationError> {
        expect_string(
            self.vehicle_variable(protocol::VAR_VEHICLECLASS, vehicle_id)
                .await?,
        )
    }

    pub async fn road_id(&mut self, vehicle_id: &str) -> Result<String, SimulationError> {
        expect_string(
            self.vehicle_variable(protocol::VAR_ROAD_ID, vehicle_id)
                .await?,
        )
    }

    pub async fn lane_id(&mut self, vehicle_id: &str) -> Result<String, SimulationError> {
        expect_string(
            self.vehicle_variable(protocol::VAR_LANE_ID, vehicle_id)
                .await?,
        )
    }
}

fn type_mismatch(expected: &str, got: &TraciValue) -> SimulationError {
    SimulationError::protocol(format!("expected {expected}, got {}", got.type_name()))
}

fn expect_double(value: TraciValue) -> Result<f64, SimulationError> {
    match value {
        TraciValue::Double(v) => Ok(v),
        other => Err(type_mismatch("double", &other)),
    }
}

fn expect_int(value: TraciValue) -> Result<i32, SimulationError> {
    match value {
        TraciValue::Int(v) => Ok(v),
        other => Err(type_mismatch("integer", &other)),
    }
}

fn expect_string(value: TraciValue) -> Result<String, SimulationError> {
    match value {
        TraciValue::String(v) => Ok(v),
        other => Err(type_mismatch("string", &other)),
    }
}
