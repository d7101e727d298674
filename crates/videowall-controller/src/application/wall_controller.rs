//! WallController: turns control-surface button presses into wall state
//! changes and feedback.
//!
//! The controller owns the [`VideoWall`] and the active video input.  Every
//! state change is published through a [`FeedbackSink`] so that every
//! connected control surface sees the same button lamps and layout values.
//!
//! # Architecture
//!
//! The use case depends only on the [`FeedbackSink`] trait and on domain
//! types from `videowall_core`.  The TCP server injects a broadcast-backed
//! sink; tests inject a recording one.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};
use videowall_core::{
    protocol::messages::{ErrorCode, MessageType, WallStateMessage, NO_ACTIVE_INPUT},
    VideoWall, WallDimensions, WallError, WallMessage,
};

/// Error type for the wall controller use case.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error(transparent)]
    Wall(#[from] WallError),

    #[error("invalid video input {input}: must be in the range [1, {max}]")]
    VideoInputOutOfRange { input: u16, max: u16 },

    #[error("failed to publish feedback: {0}")]
    Publish(String),

    #[error("message type {0:?} is not accepted by the controller")]
    Unsupported(MessageType),
}

impl ControlError {
    /// The protocol error code reported to the control surface.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            ControlError::Wall(_) => ErrorCode::InvalidPanel,
            ControlError::VideoInputOutOfRange { .. } => ErrorCode::InvalidInput,
            ControlError::Unsupported(_) => ErrorCode::UnsupportedMessage,
            ControlError::Publish(_) => ErrorCode::Internal,
        }
    }
}

/// Destination for feedback produced by button presses.
///
/// The network implementation fans messages out to every session; test
/// implementations record them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    /// Publishes one feedback message.
    async fn publish(&self, message: WallMessage) -> Result<(), String>;
}

/// The video wall controller use case.
pub struct WallController {
    wall: VideoWall,
    input_count: u16,
    active_input: u16,
    sink: Arc<dyn FeedbackSink>,
}

impl WallController {
    /// Creates a controller for an empty wall of `dims` with `input_count`
    /// selectable video inputs.
    pub fn new(dims: WallDimensions, input_count: u16, sink: Arc<dyn FeedbackSink>) -> Self {
        Self {
            wall: VideoWall::new(dims),
            input_count,
            active_input: NO_ACTIVE_INPUT,
            sink,
        }
    }

    pub fn wall(&self) -> &VideoWall {
        &self.wall
    }

    /// The last pressed video input, or [`NO_ACTIVE_INPUT`].
    pub fn active_input(&self) -> u16 {
        self.active_input
    }

    pub fn input_count(&self) -> u16 {
        self.input_count
    }

    /// Handles a panel button press.
    ///
    /// Applies the selection rules, recalculates the layout, then publishes
    /// the lamp state and layout code of every panel followed by the
    /// bounding box of the selection.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Wall`] for an invalid panel number (nothing is
    /// published) and [`ControlError::Publish`] if the sink fails.  The wall
    /// is already updated when publishing starts.
    pub async fn handle_panel_press(&mut self, number: u16) -> Result<(), ControlError> {
        self.wall.set_panel(number)?;
        self.wall.calculate_high_panel_layout();
        debug!(
            number,
            high = ?self.wall.get_high_panels(),
            "panel button pressed"
        );

        let feedback: Vec<WallMessage> = self
            .wall
            .panels()
            .map(|(panel, p)| WallMessage::PanelFeedback {
                panel,
                high: p.is_high(),
            })
            .collect();
        let layouts: Vec<WallMessage> = self
            .wall
            .panels()
            .map(|(panel, p)| WallMessage::PanelLayout {
                panel,
                layout: p.panel_layout,
            })
            .collect();

        for message in feedback.into_iter().chain(layouts) {
            self.publish(message).await?;
        }
        self.publish(WallMessage::HighPanelLayout(
            self.wall.current_high_panel_layout(),
        ))
        .await
    }

    /// Handles a video input button press.
    ///
    /// The pressed input becomes the active one (its lamp lights, the lamp of
    /// the previously active input goes out) and is routed to every high
    /// panel.  With no high panels only the input lamps change.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::VideoInputOutOfRange`] if `input` is 0 or
    /// greater than the configured input count, and
    /// [`ControlError::Publish`] if the sink fails.
    pub async fn handle_video_input_press(&mut self, input: u16) -> Result<(), ControlError> {
        if input == NO_ACTIVE_INPUT || input > self.input_count {
            return Err(ControlError::VideoInputOutOfRange {
                input,
                max: self.input_count,
            });
        }

        // State changes complete before the first await; a failed publish
        // only loses feedback.
        let previous = std::mem::replace(&mut self.active_input, input);
        let routed = self.wall.route_source_to_high_panels(input);
        debug!(input, ?routed, "video input pressed");

        if previous != NO_ACTIVE_INPUT && previous != input {
            self.publish(WallMessage::VideoInputFeedback {
                input: previous,
                active: false,
            })
            .await?;
        }
        self.publish(WallMessage::VideoInputFeedback {
            input,
            active: true,
        })
        .await?;

        for panel in routed {
            self.publish(WallMessage::PanelSource {
                panel,
                source: input,
            })
            .await?;
        }
        Ok(())
    }

    /// Full state snapshot, sent to new sessions and on request.
    pub fn snapshot(&self) -> WallStateMessage {
        WallStateMessage::from_wall(&self.wall, self.active_input)
    }

    /// Dispatches one inbound message and returns the replies meant only for
    /// the sender.
    ///
    /// Button presses reply with nothing on success (their feedback goes to
    /// the sink) and with an [`WallMessage::Error`] on failure.
    pub async fn handle_message(&mut self, message: WallMessage) -> Vec<WallMessage> {
        match self.dispatch(message).await {
            Ok(replies) => replies,
            Err(e) => {
                warn!("rejected control message: {e}");
                vec![WallMessage::error(e.error_code(), e.to_string())]
            }
        }
    }

    async fn dispatch(&mut self, message: WallMessage) -> Result<Vec<WallMessage>, ControlError> {
        match message {
            WallMessage::PanelButtonPress { panel } => {
                self.handle_panel_press(panel).await?;
                Ok(Vec::new())
            }
            WallMessage::VideoInputPress { input } => {
                self.handle_video_input_press(input).await?;
                Ok(Vec::new())
            }
            WallMessage::StateRequest => Ok(vec![WallMessage::WallState(self.snapshot())]),
            WallMessage::Ping(token) => Ok(vec![WallMessage::Pong(token)]),
            WallMessage::Pong(_) => Ok(Vec::new()),
            other => Err(ControlError::Unsupported(other.message_type())),
        }
    }

    async fn publish(&self, message: WallMessage) -> Result<(), ControlError> {
        self.sink.publish(message).await.map_err(ControlError::Publish)
    }
}
