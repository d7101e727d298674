//! Control server: TCP accept loop and per-session tasks.
//!
//! Control surfaces (touch panels, test tools) connect over TCP and speak the
//! binary framing of `videowall_core::protocol`.  Each session:
//!
//! 1. Is tagged with a random session id for the logs.
//! 2. Receives a `WallState` snapshot before anything else.
//! 3. Runs two concurrent paths:
//!    - **Surface → controller**: reads frames (24-byte header, then
//!      payload), hands each message to the shared [`WallController`] and
//!      writes any direct replies back.
//!    - **Controller → surface**: forwards every feedback message published
//!      on the [`BroadcastFeedbackSink`], so all sessions see every press.
//!
//! A frame that fails to decode is answered with an `Error` message and the
//! session continues; the header already told us where the next frame starts.
//!
//! Shutdown is triggered by clearing a shared `AtomicBool`; the accept loop
//! polls it every 200 ms.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Mutex};
use tokio::time::timeout;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;
use videowall_core::protocol::{
    decode_message, payload_length, ErrorCode, ProtocolError, SequenceCounter, WallMessage,
    HEADER_SIZE,
};

use crate::application::{FeedbackSink, WallController};

/// Capacity of the feedback broadcast channel.  A session that falls further
/// behind than this loses the oldest messages.
pub const FEEDBACK_CHANNEL_CAPACITY: usize = 256;

/// Largest payload accepted from a control surface.
pub const MAX_PAYLOAD_SIZE: usize = 64 * 1024;

/// How often the accept loop re-checks the `running` flag.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// The controller shared by every session.
pub type SharedController = Arc<Mutex<WallController>>;

/// Error type for the control server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind control listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("frame payload of {len} bytes exceeds the {max}-byte limit", max = MAX_PAYLOAD_SIZE)]
    FrameTooLarge { len: usize },
}

// ── Feedback fan-out ──────────────────────────────────────────────────────────

/// [`FeedbackSink`] that fans every message out to all connected sessions.
#[derive(Debug, Clone)]
pub struct BroadcastFeedbackSink {
    tx: broadcast::Sender<WallMessage>,
}

impl BroadcastFeedbackSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Returns a receiver that sees every message published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<WallMessage> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastFeedbackSink {
    fn default() -> Self {
        Self::new(FEEDBACK_CHANNEL_CAPACITY)
    }
}

#[async_trait]
impl FeedbackSink for BroadcastFeedbackSink {
    async fn publish(&self, message: WallMessage) -> Result<(), String> {
        // No subscribers just means no surface is connected.
        if self.tx.send(message).is_err() {
            trace!("feedback published with no sessions connected");
        }
        Ok(())
    }
}

// ── Server ────────────────────────────────────────────────────────────────────

/// The TCP control server.
pub struct ControlServer {
    listener: TcpListener,
    controller: SharedController,
    feedback: Arc<BroadcastFeedbackSink>,
}

impl ControlServer {
    /// Binds the listener.  `feedback` must be the sink `controller`
    /// publishes to.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address is in use or not
    /// permitted.
    pub async fn bind(
        addr: SocketAddr,
        controller: SharedController,
        feedback: Arc<BroadcastFeedbackSink>,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        Ok(Self {
            listener,
            controller,
            feedback,
        })
    }

    /// The address actually bound (useful with port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts control surfaces until `running` is cleared.
    ///
    /// Each connection runs in its own Tokio task; open sessions are not
    /// closed when the loop stops.
    pub async fn run(self, running: Arc<AtomicBool>) -> Result<(), ServerError> {
        info!("control server listening on {}", self.local_addr()?);

        loop {
            if !running.load(Ordering::Relaxed) {
                info!("shutdown flag set; stopping accept loop");
                break;
            }

            match timeout(ACCEPT_POLL_INTERVAL, self.listener.accept()).await {
                Ok(Ok((stream, peer_addr))) => {
                    let controller = Arc::clone(&self.controller);
                    let feedback = Arc::clone(&self.feedback);
                    tokio::spawn(async move {
                        handle_session(stream, peer_addr, controller, feedback).await;
                    });
                }
                Ok(Err(e)) => {
                    // Transient accept error (e.g. file descriptor exhaustion).
                    error!("accept error: {e}");
                }
                Err(_) => {}
            }
        }

        Ok(())
    }
}

// ── Per-session handler ───────────────────────────────────────────────────────

async fn handle_session(
    stream: TcpStream,
    peer_addr: SocketAddr,
    controller: SharedController,
    feedback: Arc<BroadcastFeedbackSink>,
) {
    let session_id = Uuid::new_v4();
    info!(%session_id, %peer_addr, "control session opened");
    match run_session(stream, session_id, controller, &feedback).await {
        Ok(()) => info!(%session_id, "control session closed"),
        Err(e) => warn!(%session_id, "control session closed with error: {e}"),
    }
}

async fn run_session(
    stream: TcpStream,
    session_id: Uuid,
    controller: SharedController,
    feedback: &BroadcastFeedbackSink,
) -> Result<(), ServerError> {
    let (reader, writer) = stream.into_split();
    let writer = Arc::new(Mutex::new(writer));
    let seq = Arc::new(SequenceCounter::new());

    // Every publish happens under the controller lock, so subscribing while
    // holding it makes the snapshot and the feedback stream line up exactly.
    let (snapshot, mut feedback_rx) = {
        let controller = controller.lock().await;
        (controller.snapshot(), feedback.subscribe())
    };
    write_message(&writer, &seq, &WallMessage::WallState(snapshot)).await?;

    let forward_writer = Arc::clone(&writer);
    let forward_seq = Arc::clone(&seq);
    let forward_task = tokio::spawn(async move {
        loop {
            match feedback_rx.recv().await {
                Ok(message) => {
                    if let Err(e) = write_message(&forward_writer, &forward_seq, &message).await {
                        debug!(%session_id, "feedback write failed: {e}");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(%session_id, skipped, "session lagging; feedback messages dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let result = read_loop(reader, session_id, &controller, &writer, &seq).await;
    forward_task.abort();
    result
}

async fn read_loop(
    mut reader: OwnedReadHalf,
    session_id: Uuid,
    controller: &SharedController,
    writer: &Mutex<OwnedWriteHalf>,
    seq: &SequenceCounter,
) -> Result<(), ServerError> {
    let mut header = [0u8; HEADER_SIZE];
    loop {
        match reader.read_exact(&mut header).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        let len = payload_length(&header)?;
        if len > MAX_PAYLOAD_SIZE {
            // The stream cannot be resynchronised without reading the payload.
            let reply = WallMessage::error(
                ErrorCode::MalformedMessage,
                format!("payload of {len} bytes is too large"),
            );
            write_message(writer, seq, &reply).await?;
            return Err(ServerError::FrameTooLarge { len });
        }

        let mut frame = vec![0u8; HEADER_SIZE + len];
        frame[..HEADER_SIZE].copy_from_slice(&header);
        reader.read_exact(&mut frame[HEADER_SIZE..]).await?;

        let message = match decode_message(&frame) {
            Ok((message, _)) => message,
            Err(e) => {
                warn!(%session_id, "undecodable frame: {e}");
                let reply = WallMessage::error(ErrorCode::MalformedMessage, e.to_string());
                write_message(writer, seq, &reply).await?;
                continue;
            }
        };

        debug!(%session_id, message_type = ?message.message_type(), "received");
        let replies = controller.lock().await.handle_message(message).await;
        for reply in &replies {
            write_message(writer, seq, reply).await?;
        }
    }
}

async fn write_message(
    writer: &Mutex<OwnedWriteHalf>,
    seq: &SequenceCounter,
    message: &WallMessage,
) -> Result<(), ServerError> {
    let bytes = seq.encode(message)?;
    let mut writer = writer.lock().await;
    writer.write_all(&bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use videowall_core::WallDimensions;

    #[tokio::test]
    async fn test_broadcast_sink_delivers_to_every_subscriber() {
        // Arrange
        let sink = BroadcastFeedbackSink::default();
        let mut a = sink.subscribe();
        let mut b = sink.subscribe();

        // Act
        sink.publish(WallMessage::PanelFeedback { panel: 3, high: true })
            .await
            .unwrap();

        // Assert
        let expected = WallMessage::PanelFeedback { panel: 3, high: true };
        assert_eq!(a.recv().await.unwrap(), expected);
        assert_eq!(b.recv().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_broadcast_sink_without_subscribers_does_not_fail() {
        let sink = BroadcastFeedbackSink::new(4);
        let result = sink.publish(WallMessage::HighPanelLayout(None)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_bind_reports_address_in_use() {
        // Arrange
        let feedback = Arc::new(BroadcastFeedbackSink::default());
        let controller = Arc::new(Mutex::new(WallController::new(
            WallDimensions::default(),
            8,
            Arc::clone(&feedback) as Arc<dyn FeedbackSink>,
        )));
        let first = ControlServer::bind(
            "127.0.0.1:0".parse().unwrap(),
            Arc::clone(&controller),
            Arc::clone(&feedback),
        )
        .await
        .unwrap();
        let taken = first.local_addr().unwrap();

        // Act
        let second = ControlServer::bind(taken, controller, feedback).await;

        // Assert
        assert!(matches!(second, Err(ServerError::Bind { addr, .. }) if addr == taken));
    }

    #[tokio::test]
    async fn test_run_returns_once_running_is_cleared() {
        let feedback = Arc::new(BroadcastFeedbackSink::default());
        let controller = Arc::new(Mutex::new(WallController::new(
            WallDimensions::default(),
            8,
            Arc::clone(&feedback) as Arc<dyn FeedbackSink>,
        )));
        let server = ControlServer::bind("127.0.0.1:0".parse().unwrap(), controller, feedback)
            .await
            .unwrap();
        let running = Arc::new(AtomicBool::new(true));

        let handle = tokio::spawn(server.run(Arc::clone(&running)));
        running.store(false, Ordering::Relaxed);

        let result = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("accept loop must stop within one poll interval")
            .unwrap();
        assert!(result.is_ok());
    }
}
