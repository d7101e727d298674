//! All video wall control protocol message types.
//!
//! Button presses flow from the control surface to the controller; feedback
//! flows back.  Every message is framed by the common 24-byte header described
//! in [`crate::protocol::codec`].

use serde::{Deserialize, Serialize};

use crate::domain::layout::HighPanelInfo;
use crate::domain::wall::VideoWall;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Current protocol version byte.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Total size of the common message header in bytes.
pub const HEADER_SIZE: usize = 24;

/// Value of [`WallStateMessage::active_input`] when no input has been pressed.
pub const NO_ACTIVE_INPUT: u16 = 0;

// ── Message type codes ────────────────────────────────────────────────────────

/// All message type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    // Control surface → controller (0x00–0x1F)
    PanelButtonPress = 0x01,
    VideoInputPress = 0x02,
    StateRequest = 0x03,
    Ping = 0x07,
    Pong = 0x08,
    Error = 0x0A,
    // Controller → control surface (0x20–0x3F)
    PanelFeedback = 0x20,
    VideoInputFeedback = 0x21,
    PanelSource = 0x22,
    PanelLayout = 0x23,
    HighPanelLayout = 0x24,
    WallState = 0x25,
}

impl TryFrom<u8> for MessageType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x01 => Ok(MessageType::PanelButtonPress),
            0x02 => Ok(MessageType::VideoInputPress),
            0x03 => Ok(MessageType::StateRequest),
            0x07 => Ok(MessageType::Ping),
            0x08 => Ok(MessageType::Pong),
            0x0A => Ok(MessageType::Error),
            0x20 => Ok(MessageType::PanelFeedback),
            0x21 => Ok(MessageType::VideoInputFeedback),
            0x22 => Ok(MessageType::PanelSource),
            0x23 => Ok(MessageType::PanelLayout),
            0x24 => Ok(MessageType::HighPanelLayout),
            0x25 => Ok(MessageType::WallState),
            _ => Err(()),
        }
    }
}

// ── Common message header ─────────────────────────────────────────────────────

/// 24-byte header prepended to every message on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    /// Protocol version; always [`PROTOCOL_VERSION`].
    pub version: u8,
    /// Identifies the payload type.
    pub message_type: MessageType,
    /// Length of the payload in bytes (not including this header).
    pub payload_length: u32,
    /// Monotonically increasing per-connection counter.
    pub sequence_number: u64,
    /// Microseconds since Unix epoch at time of generation.
    pub timestamp_us: u64,
}

// ── Error codes ───────────────────────────────────────────────────────────────

/// Reason codes carried by [`ErrorMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ErrorCode {
    /// A panel number or coordinate was outside the wall.
    InvalidPanel = 0x01,
    /// A video input number was outside the configured range.
    InvalidInput = 0x02,
    /// The frame could not be decoded.
    MalformedMessage = 0x03,
    /// The message is valid but not accepted in this direction.
    UnsupportedMessage = 0x04,
    /// Anything else.
    Internal = 0xFF,
}

impl TryFrom<u8> for ErrorCode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x01 => Ok(ErrorCode::InvalidPanel),
            0x02 => Ok(ErrorCode::InvalidInput),
            0x03 => Ok(ErrorCode::MalformedMessage),
            0x04 => Ok(ErrorCode::UnsupportedMessage),
            0xFF => Ok(ErrorCode::Internal),
            _ => Err(()),
        }
    }
}

// ── Per-message payload structs ───────────────────────────────────────────────

/// ERROR (0x0A): the controller rejected a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub code: ErrorCode,
    /// Human-readable description, for logs.
    pub description: String,
}

/// One panel's entry in a [`WallStateMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelState {
    pub high: bool,
    pub source: u16,
    pub layout: u32,
}

/// WALL_STATE (0x25): full snapshot, sent on connect and on request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallStateMessage {
    pub width: u16,
    pub height: u16,
    /// The last pressed video input, or [`NO_ACTIVE_INPUT`].
    pub active_input: u16,
    /// Panel states in panel-number order (index 0 is panel 1).
    pub panels: Vec<PanelState>,
}

impl WallStateMessage {
    /// Captures the current state of `wall`.
    pub fn from_wall(wall: &VideoWall, active_input: u16) -> Self {
        let dims = wall.dimensions();
        Self {
            width: dims.width(),
            height: dims.height(),
            active_input,
            panels: wall
                .panels()
                .map(|(_, p)| PanelState {
                    high: p.is_high(),
                    source: p.source(),
                    layout: p.panel_layout,
                })
                .collect(),
        }
    }
}

/// Every message exchanged between the control surface and the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallMessage {
    /// A panel button was pressed (1-based panel number).
    PanelButtonPress { panel: u16 },
    /// A video input button was pressed (1-based input number).
    VideoInputPress { input: u16 },
    /// Asks for a [`WallMessage::WallState`] snapshot.
    StateRequest,
    Ping(u64),
    Pong(u64),
    Error(ErrorMessage),
    /// Panel button feedback: whether the panel is high.
    PanelFeedback { panel: u16, high: bool },
    /// Video input button feedback: whether the input is the active one.
    VideoInputFeedback { input: u16, active: bool },
    /// The source now routed to a panel.
    PanelSource { panel: u16, source: u16 },
    /// The layout code of a panel (0 when not selected).
    PanelLayout { panel: u16, layout: u32 },
    /// Bounding box of the current selection, `None` when nothing is high.
    HighPanelLayout(Option<HighPanelInfo>),
    WallState(WallStateMessage),
}

impl WallMessage {
    /// Returns the [`MessageType`] discriminant for this message.
    pub fn message_type(&self) -> MessageType {
        match self {
            WallMessage::PanelButtonPress { .. } => MessageType::PanelButtonPress,
            WallMessage::VideoInputPress { .. } => MessageType::VideoInputPress,
            WallMessage::StateRequest => MessageType::StateRequest,
            WallMessage::Ping(_) => MessageType::Ping,
            WallMessage::Pong(_) => MessageType::Pong,
            WallMessage::Error(_) => MessageType::Error,
            WallMessage::PanelFeedback { .. } => MessageType::PanelFeedback,
            WallMessage::VideoInputFeedback { .. } => MessageType::VideoInputFeedback,
            WallMessage::PanelSource { .. } => MessageType::PanelSource,
            WallMessage::PanelLayout { .. } => MessageType::PanelLayout,
            WallMessage::HighPanelLayout(_) => MessageType::HighPanelLayout,
            WallMessage::WallState(_) => MessageType::WallState,
        }
    }

    /// Shorthand for building an [`WallMessage::Error`].
    pub fn error(code: ErrorCode, description: impl Into<String>) -> Self {
        WallMessage::Error(ErrorMessage {
            code,
            description: description.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_codes_round_trip_through_u8() {
        let all = [
            MessageType::PanelButtonPress,
            MessageType::VideoInputPress,
            MessageType::StateRequest,
            MessageType::Ping,
            MessageType::Pong,
            MessageType::Error,
            MessageType::PanelFeedback,
            MessageType::VideoInputFeedback,
            MessageType::PanelSource,
            MessageType::PanelLayout,
            MessageType::HighPanelLayout,
            MessageType::WallState,
        ];
        for t in all {
            assert_eq!(MessageType::try_from(t as u8), Ok(t));
        }
    }

    #[test]
    fn test_unknown_type_byte_is_rejected() {
        assert_eq!(MessageType::try_from(0x99), Err(()));
        assert_eq!(ErrorCode::try_from(0x42), Err(()));
    }

    #[test]
    fn test_wall_state_from_wall_lists_panels_in_number_order() {
        let mut wall = VideoWall::default();
        wall.set_panel(2).unwrap();
        wall.route_source_to_high_panels(4);
        wall.calculate_high_panel_layout();

        let state = WallStateMessage::from_wall(&wall, 4);

        assert_eq!((state.width, state.height, state.active_input), (4, 2, 4));
        assert_eq!(state.panels.len(), 8);
        assert_eq!(state.panels[1], PanelState { high: true, source: 4, layout: 1111 });
        assert_eq!(state.panels[0], PanelState { high: false, source: 0, layout: 0 });
    }

    #[test]
    fn test_error_shorthand_builds_error_message() {
        let msg = WallMessage::error(ErrorCode::InvalidInput, "input 12 out of range");
        assert_eq!(msg.message_type(), MessageType::Error);
        match msg {
            WallMessage::Error(e) => {
                assert_eq!(e.code, ErrorCode::InvalidInput);
                assert_eq!(e.description, "input 12 out of range");
            }
            other => panic!("unexpected message {other:?}"),
        }
    }
}
