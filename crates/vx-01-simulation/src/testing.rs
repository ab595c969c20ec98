//! Test utilities: a scripted TraCI server.
//!
//! Available in unit tests and with the `test-utils` feature.

use shared_types::VehicleState;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::domain::protocol::{self, Command, TraciValue};
use crate::error::SimulationError;

/// A single-connection TraCI server replaying a fixed script.
///
/// Step `k` (1-based) exposes `frames[k - 1]`; the reported simulation time
/// is `k * step_length`, and the minimum expected vehicle count is the
/// number of frames still to come.
pub struct MockTraciServer {
    addr: SocketAddr,
    commands_seen: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl MockTraciServer {
    /// Bind to an ephemeral local port and serve one client.
    pub async fn spawn(
        frames: Vec<Vec<VehicleState>>,
        step_length: f64,
    ) -> Result<Self, SimulationError> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let commands_seen = Arc::new(AtomicUsize::new(0));
        let counter = commands_seen.clone();

        let handle = tokio::spawn(async move {
            if let Ok((stream, _)) = listener.accept().await {
                let mut session = Session {
                    frames,
                    step_length,
                    step: 0,
                    counter,
                };
                let _ = session.serve(stream).await;
            }
        });

        Ok(Self {
            addr,
            commands_seen,
            handle,
        })
    }

    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Number of commands handled so far.
    pub fn commands_seen(&self) -> usize {
        self.commands_seen.load(Ordering::SeqCst)
    }
}

impl Drop for MockTraciServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct Session {
    frames: Vec<Vec<VehicleState>>,
    step_length: f64,
    step: usize,
    counter: Arc<AtomicUsize>,
}

impl Session {
    async fn serve(&mut self, mut stream: TcpStream) -> Result<(), SimulationError> {
        loop {
            let total = stream.read_u32().await? as usize;
            let mut body = vec![0u8; total.saturating_sub(4)];
            stream.read_exact(&mut body).await?;

            let mut reply = Vec::new();
            let mut closing = false;
            for command in protocol::decode_commands(&body)? {
                self.counter.fetch_add(1, Ordering::SeqCst);
                closing |= command.id == protocol::CMD_CLOSE;
                self.answer(&command, &mut reply)?;
            }

            let mut message = ((reply.len() + 4) as u32).to_be_bytes().to_vec();
            message.extend(reply);
            stream.write_all(&message).await?;
            if closing {
                return Ok(());
            }
        }
    }

    fn current(&self) -> &[VehicleState] {
        match self.step.checked_sub(1).and_then(|i| self.frames.get(i)) {
            Some(frame) => frame.as_slice(),
            None => &[],
        }
    }

    fn answer(&mut self, command: &Command, out: &mut Vec<u8>) -> Result<(), SimulationError> {
        match command.id {
            protocol::CMD_GET_VERSION => {
                ok(command.id).encode_into(out);
                Command::new(protocol::CMD_GET_VERSION)
                    .put_i32(21)
                    .put_string("SUMO mock 1.0")
                    .encode_into(out);
            }
            protocol::CMD_SIMSTEP => {
                self.step += 1;
                ok(command.id).encode_into(out);
                out.extend_from_slice(&0i32.to_be_bytes());
            }
            protocol::CMD_CLOSE => ok(command.id).encode_into(out),
            protocol::CMD_GET_SIM_VARIABLE | protocol::CMD_GET_VEHICLE_VARIABLE => {
                let mut reader = protocol::Reader::new(&command.content);
                let variable = reader.read_u8()?;
                let object_id = reader.read_string()?;
                match self.lookup(command.id, variable, &object_id) {
                    Ok(value) => {
                        ok(command.id).encode_into(out);
                        let mut content = Command::new(command.id + 0x10)
                            .put_u8(variable)
                            .put_string(&object_id);
                        value.encode_into(&mut content.content);
                        content.encode_into(out);
                    }
                    Err(description) => Command::new(command.id)
                        .put_u8(protocol::RTYPE_ERR)
                        .put_string(&description)
                        .encode_into(out),
                }
            }
            other => Command::new(other)
                .put_u8(protocol::RTYPE_NOTIMPLEMENTED)
                .put_string("unsupported")
                .encode_into(out),
        }
        Ok(())
    }

    fn lookup(&self, command: u8, variable: u8, object_id: &str) -> Result<TraciValue, String> {
        if command == protocol::CMD_GET_SIM_VARIABLE {
            return match variable {
                protocol::VAR_TIME => Ok(TraciValue::Double(self.step as f64 * self.step_length)),
                protocol::VAR_MIN_EXPECTED_VEHICLES => Ok(TraciValue::Int(
                    self.frames.len().saturating_sub(self.step) as i32,
                )),
                other => Err(format!("unknown simulation variable 0x{other:02x}")),
            };
        }

        if variable == protocol::ID_LIST {
            return Ok(TraciValue::StringList(
                self.current().iter().map(|v| v.id.to_string()).collect(),
            ));
        }

        let Some(vehicle) = self.current().iter().find(|v| v.id.as_str() == object_id) else {
            return Err(format!("Vehicle '{object_id}' is not known"));
        };
        match variable {
            protocol::VAR_POSITION => Ok(TraciValue::Position2D(vehicle.x, vehicle.y)),
            protocol::VAR_SPEED => Ok(TraciValue::Double(vehicle.speed)),
            protocol::VAR_ANGLE => Ok(TraciValue::Double(vehicle.angle)),
            protocol::VAR_ACCELERATION => Ok(TraciValue::Double(vehicle.acceleration)),
            protocol::VAR_VEHICLECLASS => Ok(TraciValue::String(
                vehicle.vehicle_class.clone().unwrap_or_default(),
            )),
            protocol::VAR_ROAD_ID => Ok(TraciValue::String(
                vehicle.road_id.clone().unwrap_or_default(),
            )),
            protocol::VAR_LANE_ID => Ok(TraciValue::String(
                vehicle.lane_id.clone().unwrap_or_default(),
            )),
            other => Err(format!("unknown vehicle variable 0x{other:02x}")),
        }
    }
}

fn ok(command: u8) -> Command {
    Command::new(command)
        .put_u8(protocol::RTYPE_OK)
        .put_string("")
}
