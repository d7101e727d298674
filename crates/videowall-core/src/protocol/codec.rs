//! Binary codec for encoding and decoding video wall control messages.
//!
//! Wire format:
//! ```text
//! [version:1][msg_type:1][reserved:2][payload_len:4][seq:8][timestamp_us:8][payload:N]
//! ```
//! Total header size: 24 bytes. All multi-byte integers are big-endian.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::domain::layout::HighPanelInfo;
use crate::protocol::messages::{
    ErrorCode, ErrorMessage, MessageType, PanelState, WallMessage, WallStateMessage, HEADER_SIZE,
    PROTOCOL_VERSION,
};
use thiserror::Error;

/// Bytes per panel entry inside a WALL_STATE payload.
const PANEL_STATE_SIZE: usize = 7;

/// Errors that can occur during message encoding or decoding.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The byte slice is shorter than the minimum required length.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The message type byte in the header is not a recognized value.
    #[error("unknown message type: 0x{0:02X}")]
    UnknownMessageType(u8),

    /// The protocol version in the header is not supported.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// The payload could not be parsed (field value out of range, UTF-8 error, etc.).
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The encoded payload length field does not match the actual data available.
    #[error("payload length mismatch: header says {declared}, available is {available}")]
    PayloadLengthMismatch { declared: usize, available: usize },
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`WallMessage`] into a byte vector including the 24-byte header.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedPayload`] if a variable-length field does
/// not fit its length prefix.
///
/// # Examples
///
/// ```rust
/// use videowall_core::protocol::{decode_message, encode_message};
/// use videowall_core::protocol::messages::WallMessage;
///
/// let msg = WallMessage::PanelButtonPress { panel: 3 };
/// let bytes = encode_message(&msg, 0, 0).unwrap();
/// let (decoded, consumed) = decode_message(&bytes).unwrap();
/// assert_eq!(decoded, msg);
/// assert_eq!(consumed, bytes.len());
/// ```
pub fn encode_message(
    msg: &WallMessage,
    sequence_number: u64,
    timestamp_us: u64,
) -> Result<Vec<u8>, ProtocolError> {
    let payload = encode_payload(msg)?;
    let payload_len = payload.len() as u32;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());

    buf.push(PROTOCOL_VERSION);
    buf.push(msg.message_type() as u8);
    buf.push(0x00); // reserved
    buf.push(0x00); // reserved
    buf.extend_from_slice(&payload_len.to_be_bytes());
    buf.extend_from_slice(&sequence_number.to_be_bytes());
    buf.extend_from_slice(&timestamp_us.to_be_bytes());

    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Encodes a [`WallMessage`] using the current system time as the timestamp.
///
/// # Errors
///
/// Returns [`ProtocolError`] if serialization fails.
pub fn encode_message_now(
    msg: &WallMessage,
    sequence_number: u64,
) -> Result<Vec<u8>, ProtocolError> {
    let timestamp_us = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as u64;
    encode_message(msg, sequence_number, timestamp_us)
}

/// Reads the payload length out of a complete 24-byte header.
///
/// Stream readers use this to learn how many bytes follow the header.
///
/// # Errors
///
/// Returns [`ProtocolError::InsufficientData`] if `header` is shorter than
/// [`HEADER_SIZE`].
pub fn payload_length(header: &[u8]) -> Result<usize, ProtocolError> {
    if header.len() < HEADER_SIZE {
        return Err(ProtocolError::InsufficientData {
            needed: HEADER_SIZE,
            available: header.len(),
        });
    }
    Ok(u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize)
}

/// Decodes one [`WallMessage`] from the beginning of `bytes`.
///
/// Returns the decoded message and the total number of bytes consumed
/// (header + payload), so the caller can advance their read cursor.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the bytes are malformed.
pub fn decode_message(bytes: &[u8]) -> Result<(WallMessage, usize), ProtocolError> {
    let payload_len = payload_length(bytes)?;

    let version = bytes[0];
    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedVersion(version));
    }

    let msg_type_byte = bytes[1];
    let msg_type = MessageType::try_from(msg_type_byte)
        .map_err(|_| ProtocolError::UnknownMessageType(msg_type_byte))?;

    // bytes[2..4] are reserved – ignored on decode

    let total_needed = HEADER_SIZE + payload_len;
    if bytes.len() < total_needed {
        return Err(ProtocolError::PayloadLengthMismatch {
            declared: payload_len,
            available: bytes.len() - HEADER_SIZE,
        });
    }

    let payload = &bytes[HEADER_SIZE..total_needed];
    let msg = decode_payload(msg_type, payload)?;
    Ok((msg, total_needed))
}

// ── Payload encoding ──────────────────────────────────────────────────────────

fn encode_payload(msg: &WallMessage) -> Result<Vec<u8>, ProtocolError> {
    let mut buf = Vec::new();
    match msg {
        WallMessage::PanelButtonPress { panel } => buf.extend_from_slice(&panel.to_be_bytes()),
        WallMessage::VideoInputPress { input } => buf.extend_from_slice(&input.to_be_bytes()),
        WallMessage::StateRequest => {} // empty payload
        WallMessage::Ping(token) | WallMessage::Pong(token) => {
            buf.extend_from_slice(&token.to_be_bytes())
        }
        WallMessage::Error(m) => encode_error(&mut buf, m)?,
        WallMessage::PanelFeedback { panel, high } => {
            buf.extend_from_slice(&panel.to_be_bytes());
            buf.push(u8::from(*high));
        }
        WallMessage::VideoInputFeedback { input, active } => {
            buf.extend_from_slice(&input.to_be_bytes());
            buf.push(u8::from(*active));
        }
        WallMessage::PanelSource { panel, source } => {
            buf.extend_from_slice(&panel.to_be_bytes());
            buf.extend_from_slice(&source.to_be_bytes());
        }
        WallMessage::PanelLayout { panel, layout } => {
            buf.extend_from_slice(&panel.to_be_bytes());
            buf.extend_from_slice(&layout.to_be_bytes());
        }
        WallMessage::HighPanelLayout(info) => encode_high_panel_layout(&mut buf, info.as_ref()),
        WallMessage::WallState(m) => encode_wall_state(&mut buf, m)?,
    }
    Ok(buf)
}

// ── Payload decoding ──────────────────────────────────────────────────────────

fn decode_payload(msg_type: MessageType, payload: &[u8]) -> Result<WallMessage, ProtocolError> {
    match msg_type {
        MessageType::PanelButtonPress => {
            require_len(payload, 2, "PanelButtonPress")?;
            Ok(WallMessage::PanelButtonPress {
                panel: read_u16(payload, 0),
            })
        }
        MessageType::VideoInputPress => {
            require_len(payload, 2, "VideoInputPress")?;
            Ok(WallMessage::VideoInputPress {
                input: read_u16(payload, 0),
            })
        }
        MessageType::StateRequest => Ok(WallMessage::StateRequest),
        MessageType::Ping => {
            require_len(payload, 8, "Ping")?;
            Ok(WallMessage::Ping(read_u64(payload, 0)))
        }
        MessageType::Pong => {
            require_len(payload, 8, "Pong")?;
            Ok(WallMessage::Pong(read_u64(payload, 0)))
        }
        MessageType::Error => decode_error(payload).map(WallMessage::Error),
        MessageType::PanelFeedback => {
            require_len(payload, 3, "PanelFeedback")?;
            Ok(WallMessage::PanelFeedback {
                panel: read_u16(payload, 0),
                high: payload[2] != 0,
            })
        }
        MessageType::VideoInputFeedback => {
            require_len(payload, 3, "VideoInputFeedback")?;
            Ok(WallMessage::VideoInputFeedback {
                input: read_u16(payload, 0),
                active: payload[2] != 0,
            })
        }
        MessageType::PanelSource => {
            require_len(payload, 4, "PanelSource")?;
            Ok(WallMessage::PanelSource {
                panel: read_u16(payload, 0),
                source: read_u16(payload, 2),
            })
        }
        MessageType::PanelLayout => {
            require_len(payload, 6, "PanelLayout")?;
            Ok(WallMessage::PanelLayout {
                panel: read_u16(payload, 0),
                layout: read_u32(payload, 2),
            })
        }
        MessageType::HighPanelLayout => {
            decode_high_panel_layout(payload).map(WallMessage::HighPanelLayout)
        }
        MessageType::WallState => decode_wall_state(payload).map(WallMessage::WallState),
    }
}

// ── Per-message helpers ───────────────────────────────────────────────────────

fn encode_error(buf: &mut Vec<u8>, m: &ErrorMessage) -> Result<(), ProtocolError> {
    buf.push(m.code as u8);
    write_length_prefixed_string(buf, &m.description)
}

fn decode_error(p: &[u8]) -> Result<ErrorMessage, ProtocolError> {
    require_len(p, 3, "Error")?;
    let code = ErrorCode::try_from(p[0])
        .map_err(|_| ProtocolError::MalformedPayload(format!("unknown error code: {}", p[0])))?;
    let (description, _) = read_length_prefixed_string(p, 1)?;
    Ok(ErrorMessage { code, description })
}

fn encode_high_panel_layout(buf: &mut Vec<u8>, info: Option<&HighPanelInfo>) {
    match info {
        None => buf.push(0x00),
        Some(info) => {
            buf.push(0x01);
            for v in [info.w, info.h, info.x, info.y] {
                buf.extend_from_slice(&v.to_be_bytes());
            }
        }
    }
}

fn decode_high_panel_layout(p: &[u8]) -> Result<Option<HighPanelInfo>, ProtocolError> {
    require_len(p, 1, "HighPanelLayout")?;
    match p[0] {
        0x00 => Ok(None),
        0x01 => {
            require_len(p, 9, "HighPanelLayout")?;
            Ok(Some(HighPanelInfo {
                w: read_u16(p, 1),
                h: read_u16(p, 3),
                x: read_u16(p, 5),
                y: read_u16(p, 7),
            }))
        }
        other => Err(ProtocolError::MalformedPayload(format!(
            "HighPanelLayout: invalid presence flag {other}"
        ))),
    }
}

fn encode_wall_state(buf: &mut Vec<u8>, m: &WallStateMessage) -> Result<(), ProtocolError> {
    let count = u16::try_from(m.panels.len()).map_err(|_| {
        ProtocolError::MalformedPayload(format!("too many panels: {}", m.panels.len()))
    })?;
    buf.extend_from_slice(&m.width.to_be_bytes());
    buf.extend_from_slice(&m.height.to_be_bytes());
    buf.extend_from_slice(&m.active_input.to_be_bytes());
    buf.extend_from_slice(&count.to_be_bytes());
    for panel in &m.panels {
        buf.push(u8::from(panel.high));
        buf.extend_from_slice(&panel.source.to_be_bytes());
        buf.extend_from_slice(&panel.layout.to_be_bytes());
    }
    Ok(())
}

fn decode_wall_state(p: &[u8]) -> Result<WallStateMessage, ProtocolError> {
    // width (2) + height (2) + active_input (2) + count (2)
    require_len(p, 8, "WallState")?;
    let width = read_u16(p, 0);
    let height = read_u16(p, 2);
    let active_input = read_u16(p, 4);
    let count = usize::from(read_u16(p, 6));

    if count != usize::from(width) * usize::from(height) {
        return Err(ProtocolError::MalformedPayload(format!(
            "WallState: {count} panels for a {width}x{height} wall"
        )));
    }
    require_len(p, 8 + count * PANEL_STATE_SIZE, "WallState")?;

    let panels = p[8..8 + count * PANEL_STATE_SIZE]
        .chunks_exact(PANEL_STATE_SIZE)
        .map(|entry| PanelState {
            high: entry[0] != 0,
            source: read_u16(entry, 1),
            layout: read_u32(entry, 3),
        })
        .collect();

    Ok(WallStateMessage {
        width,
        height,
        active_input,
        panels,
    })
}

// ── Utility helpers ───────────────────────────────────────────────────────────

fn require_len(buf: &[u8], needed: usize, context: &str) -> Result<(), ProtocolError> {
    if buf.len() < needed {
        Err(ProtocolError::MalformedPayload(format!(
            "{context}: need {needed} bytes, got {}",
            buf.len()
        )))
    } else {
        Ok(())
    }
}

// The fixed-width readers assume the caller already checked the length with
// `require_len`.

fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

fn read_u64(buf: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_be_bytes(bytes)
}

/// Writes a 2-byte length prefix followed by the UTF-8 string bytes.
fn write_length_prefixed_string(buf: &mut Vec<u8>, s: &str) -> Result<(), ProtocolError> {
    let len = u16::try_from(s.len()).map_err(|_| {
        ProtocolError::MalformedPayload(format!("string of {} bytes exceeds u16 prefix", s.len()))
    })?;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

/// Reads a 2-byte length prefix and then that many UTF-8 bytes.
/// Returns the string and the offset of the byte after the string.
fn read_length_prefixed_string(buf: &[u8], offset: usize) -> Result<(String, usize), ProtocolError> {
    if buf.len() < offset + 2 {
        return Err(ProtocolError::MalformedPayload(format!(
            "need 2 bytes for string length at offset {offset}"
        )));
    }
    let len = usize::from(read_u16(buf, offset));
    let start = offset + 2;
    if buf.len() < start + len {
        return Err(ProtocolError::MalformedPayload(format!(
            "string of length {len} at offset {start} exceeds buffer"
        )));
    }
    let s = std::str::from_utf8(&buf[start..start + len])
        .map_err(|e| ProtocolError::MalformedPayload(format!("invalid UTF-8: {e}")))?
        .to_string();
    Ok((s, start + len))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
