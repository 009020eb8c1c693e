//! Wire format
//!
//! Every datagram carries exactly one message and the kind of message is
//! recognized by its length alone. For a given `Protocol` the lengths of
//! the messages a coordinator receives are pairwise disjoint:
//!
//! | Message            | Bytes           | Layout                              |
//! |--------------------|-----------------|-------------------------------------|
//! | SceneLine          | variable        | `{index}~{total}~{payload}[~{w}~{h}]` |
//! | MissingLine        | 4               | 0-based line index                  |
//! | Confirmation       | 0               |                                     |
//! | RenderRequest row  | 4               | `y`                                 |
//! | RenderRequest pixel| 8               | `x` `y`                             |
//! | RenderResult row   | 4 + width * 3   | `y` then RGB bytes                  |
//! | RenderResult pixel | 11              | RGB bytes, `x`, `y`                 |
//!
//! Integers are 4-byte big-endian. A worker tells scene fragments and render
//! requests apart by its own phase: requests only follow a complete scene.

use crate::{NetError, MAX_DATAGRAM};
use byteorder::{BigEndian, ByteOrder};
use rayfarm_core::app::Granularity;
use rayfarm_core::camera::*;
use rayfarm_core::film::CHANNELS;
use std::fmt;

/// Separates the fields of a scene fragment.
pub const FIELD_SEPARATOR: char = '~';

/// Length of a missing line request.
pub const MISSING_LINE_LEN: usize = 4;

/// Length of a confirmation.
pub const CONFIRMATION_LEN: usize = 0;

/// Length of a row render request.
pub const ROW_REQUEST_LEN: usize = 4;

/// Length of a pixel render request.
pub const PIXEL_REQUEST_LEN: usize = 8;

/// Length of a pixel render result.
pub const PIXEL_RESULT_LEN: usize = 11;

/// One line of scene text as carried in a single datagram.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SceneLine {
    /// 1-based line index.
    pub index: u32,

    /// Number of lines in the scene.
    pub total: u32,

    /// Line text.
    pub payload: String,

    /// Image resolution. Only sent in pixel mode.
    pub view: Option<View>,
}

impl SceneLine {
    /// Returns the datagram bytes.
    pub fn encode(&self) -> Vec<u8> {
        let sep = FIELD_SEPARATOR;
        let mut s = format!("{}{sep}{}{sep}{}", self.index, self.total, self.payload);
        if let Some(view) = self.view {
            s.push_str(&format!("{sep}{}{sep}{}", view.width, view.height));
        }
        s.into_bytes()
    }

    /// Decode a datagram.
    ///
    /// * `bytes` - Datagram bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, NetError> {
        let text = std::str::from_utf8(bytes).map_err(|e| NetError::Malformed(format!("scene line: {e}")))?;
        let fields: Vec<&str> = text.split(FIELD_SEPARATOR).collect();
        if fields.len() != 3 && fields.len() != 5 {
            return Err(NetError::Malformed(format!(
                "scene line has {} fields",
                fields.len()
            )));
        }

        let number = |s: &str| {
            s.parse::<u32>()
                .map_err(|_| NetError::Malformed(format!("scene line field '{s}' is not a number")))
        };
        let index = number(fields[0])?;
        let total = number(fields[1])?;
        if index == 0 || index > total {
            return Err(NetError::Malformed(format!("scene line {index} of {total}")));
        }

        let view = if fields.len() == 5 {
            let (width, height) = (number(fields[3])?, number(fields[4])?);
            if width == 0 || height == 0 {
                return Err(NetError::Malformed(format!("scene view {width}x{height}")));
            }
            Some(View::new(width, height))
        } else {
            None
        };

        Ok(Self {
            index,
            total,
            payload: fields[2].to_string(),
            view,
        })
    }
}

/// One schedulable piece of the image.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WorkUnit {
    /// A whole row.
    Row(u32),

    /// A single pixel.
    Pixel { x: u32, y: u32 },
}

impl WorkUnit {
    /// Returns true if the unit lies inside the image.
    ///
    /// * `view` - Image resolution.
    pub fn is_inside(&self, view: &View) -> bool {
        match *self {
            Self::Row(y) => y < view.height,
            Self::Pixel { x, y } => view.contains(x, y),
        }
    }
}

impl fmt::Display for WorkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Row(y) => write!(f, "row {y}"),
            Self::Pixel { x, y } => write!(f, "pixel ({x}, {y})"),
        }
    }
}

/// Rendered output of one work unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderResult {
    /// A whole row, three bytes per pixel.
    Row { y: u32, pixels: Vec<u8> },

    /// A single pixel.
    Pixel { x: u32, y: u32, rgb: [u8; 3] },
}

impl RenderResult {
    /// Returns the work unit this result completes.
    pub fn unit(&self) -> WorkUnit {
        match *self {
            Self::Row { y, .. } => WorkUnit::Row(y),
            Self::Pixel { x, y, .. } => WorkUnit::Pixel { x, y },
        }
    }
}

/// Every message exchanged between coordinator and workers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    SceneLine(SceneLine),       // coordinator -> worker
    MissingLine(u32),           // worker -> coordinator, 0-based
    Confirmation,               // worker -> coordinator
    RenderRequest(WorkUnit),    // coordinator -> worker
    RenderResult(RenderResult), // worker -> coordinator
}

impl Message {
    /// Returns the datagram bytes.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::SceneLine(line) => line.encode(),
            Self::MissingLine(index) => u32_bytes(*index).to_vec(),
            Self::Confirmation => vec![],
            Self::RenderRequest(WorkUnit::Row(y)) => u32_bytes(*y).to_vec(),
            Self::RenderRequest(WorkUnit::Pixel { x, y }) => {
                let mut buf = vec![0; PIXEL_REQUEST_LEN];
                BigEndian::write_u32(&mut buf[0..4], *x);
                BigEndian::write_u32(&mut buf[4..8], *y);
                buf
            }
            Self::RenderResult(RenderResult::Row { y, pixels }) => {
                let mut buf = Vec::with_capacity(4 + pixels.len());
                buf.extend_from_slice(&u32_bytes(*y));
                buf.extend_from_slice(pixels);
                buf
            }
            Self::RenderResult(RenderResult::Pixel { x, y, rgb }) => {
                let mut buf = vec![0; PIXEL_RESULT_LEN];
                buf[0..3].copy_from_slice(rgb);
                BigEndian::write_u32(&mut buf[3..7], *x);
                BigEndian::write_u32(&mut buf[7..11], *y);
                buf
            }
        }
    }
}

fn u32_bytes(v: u32) -> [u8; 4] {
    let mut buf = [0; 4];
    BigEndian::write_u32(&mut buf, v);
    buf
}

/// Codec for one job: the work granularity and image resolution fix the
/// request and result lengths.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Protocol {
    /// Work granularity.
    pub granularity: Granularity,

    /// Image resolution.
    pub view: View,
}

impl Protocol {
    /// Create a protocol, checking that every message fits in a datagram
    /// and that the coordinator can tell all inbound messages apart.
    ///
    /// * `granularity` - Work granularity.
    /// * `view`        - Image resolution.
    pub fn new(granularity: Granularity, view: View) -> Result<Self, NetError> {
        if view.width == 0 || view.height == 0 {
            return Err(NetError::InvalidProtocol(format!(
                "empty image {}x{}",
                view.width, view.height
            )));
        }

        let protocol = Self { granularity, view };
        let result_len = protocol.result_len();
        if result_len > MAX_DATAGRAM {
            return Err(NetError::InvalidProtocol(format!(
                "row result of {result_len} bytes exceeds datagram limit"
            )));
        }
        if result_len == CONFIRMATION_LEN || result_len == MISSING_LINE_LEN {
            return Err(NetError::InvalidProtocol(format!(
                "result length {result_len} collides with control messages"
            )));
        }
        Ok(protocol)
    }

    /// Returns the length of a render request.
    pub fn request_len(&self) -> usize {
        match self.granularity {
            Granularity::Row => ROW_REQUEST_LEN,
            Granularity::Pixel => PIXEL_REQUEST_LEN,
        }
    }

    /// Returns the length of a render result.
    pub fn result_len(&self) -> usize {
        match self.granularity {
            Granularity::Row => 4 + self.view.width as usize * CHANNELS,
            Granularity::Pixel => PIXEL_RESULT_LEN,
        }
    }

    /// Returns the view carried in scene fragments. Only pixel mode sends
    /// it; in row mode the worker takes it from the scene.
    pub fn fragment_view(&self) -> Option<View> {
        match self.granularity {
            Granularity::Row => None,
            Granularity::Pixel => Some(self.view),
        }
    }

    /// Returns every work unit of the image in row-major order.
    pub fn units(&self) -> Vec<WorkUnit> {
        let View { width, height } = self.view;
        match self.granularity {
            Granularity::Row => (0..height).map(WorkUnit::Row).collect(),
            Granularity::Pixel => (0..height)
                .flat_map(|y| (0..width).map(move |x| WorkUnit::Pixel { x, y }))
                .collect(),
        }
    }

    /// Decode a datagram received by the coordinator. Returns `None` for
    /// datagrams of any other length.
    ///
    /// * `bytes` - Datagram bytes.
    pub fn decode_at_coordinator(&self, bytes: &[u8]) -> Option<Message> {
        match bytes.len() {
            CONFIRMATION_LEN => Some(Message::Confirmation),
            MISSING_LINE_LEN => Some(Message::MissingLine(BigEndian::read_u32(bytes))),
            n if n == self.result_len() => Some(Message::RenderResult(self.decode_result(bytes))),
            _ => None,
        }
    }

    fn decode_result(&self, bytes: &[u8]) -> RenderResult {
        match self.granularity {
            Granularity::Row => RenderResult::Row {
                y: BigEndian::read_u32(&bytes[0..4]),
                pixels: bytes[4..].to_vec(),
            },
            Granularity::Pixel => RenderResult::Pixel {
                x: BigEndian::read_u32(&bytes[3..7]),
                y: BigEndian::read_u32(&bytes[7..11]),
                rgb: [bytes[0], bytes[1], bytes[2]],
            },
        }
    }

    /// Decode a datagram received by a worker that already holds the whole
    /// scene. Datagrams of request length are requests; anything else is
    /// tried as a late scene fragment.
    ///
    /// * `bytes` - Datagram bytes.
    pub fn decode_at_worker(&self, bytes: &[u8]) -> Option<Message> {
        if bytes.len() == self.request_len() {
            let unit = match self.granularity {
                Granularity::Row => WorkUnit::Row(BigEndian::read_u32(bytes)),
                Granularity::Pixel => WorkUnit::Pixel {
                    x: BigEndian::read_u32(&bytes[0..4]),
                    y: BigEndian::read_u32(&bytes[4..8]),
                },
            };
            return Some(Message::RenderRequest(unit));
        }
        SceneLine::decode(bytes).ok().map(Message::SceneLine)
    }
}
