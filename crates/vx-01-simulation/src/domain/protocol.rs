//! TraCI wire format.
//!
//! Pure encoding and decoding, no I/O. All integers are big-endian.
//!
//! ```text
//! message  := u32 total_len (includes itself) command*
//! command  := u8 len cmd_id content            when len <= 255
//!           | 0x00 u32 len cmd_id content      otherwise
//! string   := u32 byte_len utf8
//! ```
//!
//! Every reply message opens with a status command echoing the request id:
//! `result u8` (0x00 OK, 0x01 not implemented, 0xFF error) and a string.

use crate::error::SimulationError;

// =============================================================================
// COMMAND IDS
// =============================================================================

pub const CMD_GET_VERSION: u8 = 0x00;
pub const CMD_SIMSTEP: u8 = 0x02;
pub const CMD_CLOSE: u8 = 0x7F;
pub const CMD_GET_VEHICLE_VARIABLE: u8 = 0xA4;
pub const RESPONSE_GET_VEHICLE_VARIABLE: u8 = 0xB4;
pub const CMD_GET_SIM_VARIABLE: u8 = 0xAB;
pub const RESPONSE_GET_SIM_VARIABLE: u8 = 0xBB;

// =============================================================================
// VARIABLE IDS
// =============================================================================

pub const ID_LIST: u8 = 0x00;
pub const VAR_SPEED: u8 = 0x40;
pub const VAR_POSITION: u8 = 0x42;
pub const VAR_ANGLE: u8 = 0x43;
pub const VAR_VEHICLECLASS: u8 = 0x49;
pub const VAR_ROAD_ID: u8 = 0x50;
pub const VAR_LANE_ID: u8 = 0x51;
pub const VAR_ACCELERATION: u8 = 0x72;
pub const VAR_TIME: u8 = 0x66;
pub const VAR_MIN_EXPECTED_VEHICLES: u8 = 0x7D;

// =============================================================================
// TYPE TAGS
// =============================================================================

pub const TYPE_POSITION2D: u8 = 0x01;
pub const TYPE_UBYTE: u8 = 0x07;
pub const TYPE_INTEGER: u8 = 0x09;
pub const TYPE_DOUBLE: u8 = 0x0B;
pub const TYPE_STRING: u8 = 0x0C;
pub const TYPE_STRINGLIST: u8 = 0x0E;

// =============================================================================
// STATUS CODES
// =============================================================================

pub const RTYPE_OK: u8 = 0x00;
pub const RTYPE_NOTIMPLEMENTED: u8 = 0x01;
pub const RTYPE_ERR: u8 = 0xFF;

/// A single command, either outgoing or parsed from a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub id: u8,
    pub content: Vec<u8>,
}

impl Command {
    pub fn new(id: u8) -> Self {
        Self {
            id,
            content: Vec::new(),
        }
    }

    pub fn put_u8(mut self, value: u8) -> Self {
        self.content.push(value);
        self
    }

    pub fn put_i32(mut self, value: i32) -> Self {
        self.content.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn put_f64(mut self, value: f64) -> Self {
        self.content.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn put_string(mut self, value: &str) -> Self {
        self.content
            .extend_from_slice(&(value.len() as u32).to_be_bytes());
        self.content.extend_from_slice(value.as_bytes());
        self
    }

    /// A variable query: `var_id` followed by the object id string.
    pub fn get_variable(command: u8, var_id: u8, object_id: &str) -> Self {
        Self::new(command).put_u8(var_id).put_string(object_id)
    }

    /// Append the framed command (length prefix, id, content) to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let short_len = 1 + 1 + self.content.len();
        if short_len <= 255 {
            out.push(short_len as u8);
        } else {
            out.push(0);
            out.extend_from_slice(&((4 + short_len) as u32).to_be_bytes());
        }
        out.push(self.id);
        out.extend_from_slice(&self.content);
    }
}

/// Frame commands into one message.
pub fn encode_message(commands: &[Command]) -> Vec<u8> {
    let mut body = Vec::new();
    for command in commands {
        command.encode_into(&mut body);
    }
    let mut out = Vec::with_capacity(body.len() + 4);
    out.extend_from_slice(&((body.len() + 4) as u32).to_be_bytes());
    out.extend(body);
    out
}

/// Split a message body (everything after the u32 length) into commands.
pub fn decode_commands(body: &[u8]) -> Result<Vec<Command>, SimulationError> {
    let mut commands = Vec::new();
    let mut reader = Reader::new(body);
    while !reader.is_empty() {
        commands.push(read_command(&mut reader)?);
    }
    Ok(commands)
}

/// Read one framed command at the reader's position.
pub fn read_command(reader: &mut Reader<'_>) -> Result<Command, SimulationError> {
    let start = reader.position();
    let short = reader.read_u8()?;
    let len = if short == 0 {
        reader.read_u32()? as usize
    } else {
        short as usize
    };
    let header = reader.position() - start;
    if len < header + 1 {
        return Err(SimulationError::protocol(format!(
            "command length {len} shorter than its header"
        )));
    }
    let id = reader.read_u8()?;
    let content = reader.read_bytes(len - header - 1)?;
    Ok(Command {
        id,
        content: content.to_vec(),
    })
}

/// Separate the leading status command of a reply from the payload after it.
///
/// The payload is not always a command list: a step reply continues with a
/// raw subscription count.
pub fn split_reply(body: &[u8]) -> Result<(Status, &[u8]), SimulationError> {
    let mut reader = Reader::new(body);
    let status = Status::parse(&read_command(&mut reader)?)?;
    let rest = reader.read_bytes(body.len() - reader.position())?;
    Ok((status, rest))
}

/// Status command at the head of every reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub command: u8,
    pub result: u8,
    pub description: String,
}

impl Status {
    pub fn parse(command: &Command) -> Result<Self, SimulationError> {
        let mut reader = Reader::new(&command.content);
        let result = reader.read_u8()?;
        let description = reader.read_string()?;
        Ok(Self {
            command: command.id,
            result,
            description,
        })
    }

    /// Map a non-OK status onto [`SimulationError::CommandFailed`].
    pub fn into_result(self) -> Result<(), SimulationError> {
        match self.result {
            RTYPE_OK => Ok(()),
            RTYPE_NOTIMPLEMENTED => Err(SimulationError::CommandFailed {
                command: self.command,
                description: format!("not implemented: {}", self.description),
            }),
            _ => Err(SimulationError::CommandFailed {
                command: self.command,
                description: self.description,
            }),
        }
    }
}

/// A typed value from a variable response.
#[derive(Debug, Clone, PartialEq)]
pub enum TraciValue {
    UByte(u8),
    Int(i32),
    Double(f64),
    String(String),
    StringList(Vec<String>),
    Position2D(f64, f64),
}

impl TraciValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::UByte(_) => "ubyte",
            Self::Int(_) => "integer",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::StringList(_) => "stringlist",
            Self::Position2D(..) => "position2d",
        }
    }

    /// Encode with its type tag (used by the test server).
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Self::UByte(v) => {
                out.push(TYPE_UBYTE);
                out.push(*v);
            }
            Self::Int(v) => {
                out.push(TYPE_INTEGER);
                out.extend_from_slice(&v.to_be_bytes());
            }
            Self::Double(v) => {
                out.push(TYPE_DOUBLE);
                out.extend_from_slice(&v.to_be_bytes());
            }
            Self::String(s) => {
                out.push(TYPE_STRING);
                put_string(out, s);
            }
            Self::StringList(items) => {
                out.push(TYPE_STRINGLIST);
                out.extend_from_slice(&(items.len() as u32).to_be_bytes());
                for s in items {
                    put_string(out, s);
                }
            }
            Self::Position2D(x, y) => {
                out.push(TYPE_POSITION2D);
                out.extend_from_slice(&x.to_be_bytes());
                out.extend_from_slice(&y.to_be_bytes());
            }
        }
    }
}

fn put_string(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u32).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
}

/// Decoded body of a get-variable reply.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableResponse {
    pub variable: u8,
    pub object_id: String,
    pub value: TraciValue,
}

impl VariableResponse {
    pub fn parse(command: &Command) -> Result<Self, SimulationError> {
        let mut reader = Reader::new(&command.content);
        let variable = reader.read_u8()?;
        let object_id = reader.read_string()?;
        let value = reader.read_value()?;
        Ok(Self {
            variable,
            object_id,
            value,
        })
    }
}

/// Cursor over a byte slice.
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], SimulationError> {
        let end = self.pos.checked_add(n).filter(|end| *end <= self.data.len());
        let Some(end) = end else {
            return Err(SimulationError::protocol(format!(
                "truncated: wanted {n} bytes at offset {}, have {}",
                self.pos,
                self.data.len() - self.pos
            )));
        };
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], SimulationError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, SimulationError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32, SimulationError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, SimulationError> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, SimulationError> {
        Ok(f64::from_be_bytes(self.read_array()?))
    }

    pub fn read_string(&mut self) -> Result<String, SimulationError> {
        let len = self.read_u32()? as usize;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| SimulationError::protocol(format!("invalid utf-8 string: {e}")))
    }

    /// Read a type tag and the value it announces.
    pub fn read_value(&mut self) -> Result<TraciValue, SimulationError> {
        let tag = self.read_u8()?;
        let value = match tag {
            TYPE_UBYTE => TraciValue::UByte(self.read_u8()?),
            TYPE_INTEGER => TraciValue::Int(self.read_i32()?),
            TYPE_DOUBLE => TraciValue::Double(self.read_f64()?),
            TYPE_STRING => TraciValue::String(self.read_string()?),
            TYPE_STRINGLIST => {
                let count = self.read_u32()? as usize;
                let mut items = Vec::with_capacity(count.min(4096));
                for _ in 0..count {
                    items.push(self.read_string()?);
                }
                TraciValue::StringList(items)
            }
            TYPE_POSITION2D => TraciValue::Position2D(self.read_f64()?, self.read_f64()?),
            other => {
                return Err(SimulationError::protocol(format!(
                    "unsupported type tag 0x{other:02x}"
                )))
            }
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_short_command_framing() {
        let msg = encode_message(&[Command::new(CMD_SIMSTEP).put_f64(0.0)]);
        // 4 length + 1 len + 1 id + 8 double
        assert_eq!(msg.len(), 14);
        assert_eq!(&msg[..4], &14u32.to_be_bytes());
        assert_eq!(msg[4], 10);
        assert_eq!(msg[5], CMD_SIMSTEP);
    }

    #[test]
    fn test_long_command_uses_extended_length() {
        let id = "v".repeat(300);
        let cmd = Command::get_variable(CMD_GET_VEHICLE_VARIABLE, VAR_SPEED, &id);
        let mut out = Vec::new();
        cmd.encode_into(&mut out);
        assert_eq!(out[0], 0);
        let len = u32::from_be_bytes([out[1], out[2], out[3], out[4]]) as usize;
        assert_eq!(len, out.len());

        let decoded = decode_commands(&out).unwrap();
        assert_eq!(decoded, vec![cmd]);
    }

    #[test]
    fn test_status_error_maps_to_command_failed() {
        let cmd = Command::new(CMD_GET_VEHICLE_VARIABLE)
            .put_u8(RTYPE_ERR)
            .put_string("Vehicle 'ghost' is not known");
        let err = Status::parse(&cmd).unwrap().into_result().unwrap_err();
        match err {
            SimulationError::CommandFailed {
                command,
                description,
            } => {
                assert_eq!(command, CMD_GET_VEHICLE_VARIABLE);
                assert!(description.contains("ghost"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_variable_response_position() {
        let mut content = vec![VAR_POSITION];
        put_string(&mut content, "veh_1");
        TraciValue::Position2D(12.5, -3.0).encode_into(&mut content);
        let cmd = Command {
            id: RESPONSE_GET_VEHICLE_VARIABLE,
            content,
        };
        let resp = VariableResponse::parse(&cmd).unwrap();
        assert_eq!(resp.object_id, "veh_1");
        assert_eq!(resp.value, TraciValue::Position2D(12.5, -3.0));
    }

    #[test]
    fn test_truncated_input_is_protocol_error() {
        let mut reader = Reader::new(&[0, 0, 0, 9, b'a']);
        assert!(matches!(
            reader.read_string(),
            Err(SimulationError::Protocol(_))
        ));
        assert!(matches!(
            decode_commands(&[5, 0x02]),
            Err(SimulationError::Protocol(_))
        ));
    }

    #[test]
    fn test_split_reply_keeps_raw_payload() {
        let status = Command::new(CMD_SIMSTEP).put_u8(RTYPE_OK).put_string("");
        let mut body = Vec::new();
        status.encode_into(&mut body);
        body.extend_from_slice(&0i32.to_be_bytes());

        let (status, rest) = split_reply(&body).unwrap();
        assert_eq!(status.command, CMD_SIMSTEP);
        assert_eq!(status.result, RTYPE_OK);
        assert_eq!(rest, &[0, 0, 0, 0]);
    }

    #[test]
    fn test_unknown_type_tag() {
        let mut reader = Reader::new(&[0x42]);
        assert!(reader.read_value().is_err());
    }

    proptest! {
        #[test]
        fn prop_string_lists_survive_framing(ids in proptest::collection::vec("[a-z0-9_.#]{0,40}", 0..40)) {
            let mut content = vec![ID_LIST];
            put_string(&mut content, "");
            TraciValue::StringList(ids.clone()).encode_into(&mut content);
            let cmd = Command { id: RESPONSE_GET_VEHICLE_VARIABLE, content };

            let msg = encode_message(&[cmd]);
            let commands = decode_commands(&msg[4..]).unwrap();
            let resp = VariableResponse::parse(&commands[0]).unwrap();
            prop_assert_eq!(resp.value, TraciValue::StringList(ids));
        }
    }
}
