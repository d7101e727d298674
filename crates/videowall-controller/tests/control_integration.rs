//! End-to-end tests for the control server.
//!
//! Each test starts a real server on an ephemeral localhost port and talks to
//! it with the binary protocol over plain TCP, the way a control surface does.

use std::net::SocketAddr;
use std::sync::{atomic::AtomicBool, Arc};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use videowall_controller::application::{FeedbackSink, WallController};
use videowall_controller::infrastructure::network::{BroadcastFeedbackSink, ControlServer};
use videowall_core::protocol::{
    decode_message, encode_message, payload_length, ErrorCode, WallMessage, HEADER_SIZE,
};
use videowall_core::{HighPanelInfo, WallDimensions};

const IO_TIMEOUT: Duration = Duration::from_secs(5);

async fn start_server() -> (SocketAddr, Arc<AtomicBool>) {
    let feedback = Arc::new(BroadcastFeedbackSink::default());
    let controller = Arc::new(Mutex::new(WallController::new(
        WallDimensions::default(),
        8,
        Arc::clone(&feedback) as Arc<dyn FeedbackSink>,
    )));
    let server = ControlServer::bind("127.0.0.1:0".parse().unwrap(), controller, feedback)
        .await
        .expect("bind");
    let addr = server.local_addr().expect("local addr");
    let running = Arc::new(AtomicBool::new(true));
    tokio::spawn(server.run(Arc::clone(&running)));
    (addr, running)
}

async fn send(stream: &mut TcpStream, message: &WallMessage) {
    let bytes = encode_message(message, 0, 0).expect("encode");
    stream.write_all(&bytes).await.expect("write");
}

async fn recv(stream: &mut TcpStream) -> WallMessage {
    timeout(IO_TIMEOUT, async {
        let mut header = [0u8; HEADER_SIZE];
        stream.read_exact(&mut header).await.expect("read header");
        let len = payload_length(&header).expect("payload length");
        let mut frame = vec![0u8; HEADER_SIZE + len];
        frame[..HEADER_SIZE].copy_from_slice(&header);
        stream
            .read_exact(&mut frame[HEADER_SIZE..])
            .await
            .expect("read payload");
        decode_message(&frame).expect("decode").0
    })
    .await
    .expect("timed out waiting for a message")
}

/// Connects and consumes the initial snapshot.
async fn connect(addr: SocketAddr) -> TcpStream {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    let first = recv(&mut stream).await;
    assert!(
        matches!(first, WallMessage::WallState(_)),
        "first message must be a snapshot, got {first:?}"
    );
    stream
}

#[tokio::test]
async fn test_new_session_receives_empty_wall_snapshot() {
    let (addr, _running) = start_server().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let WallMessage::WallState(state) = recv(&mut stream).await else {
        panic!("expected a WallState snapshot");
    };

    assert_eq!((state.width, state.height, state.active_input), (4, 2, 0));
    assert_eq!(state.panels.len(), 8);
    assert!(state.panels.iter().all(|p| !p.high && p.layout == 0));
}

#[tokio::test]
async fn test_panel_press_produces_feedback_for_the_whole_wall() {
    // Arrange
    let (addr, _running) = start_server().await;
    let mut stream = connect(addr).await;

    // Act
    send(&mut stream, &WallMessage::PanelButtonPress { panel: 2 }).await;
    let mut received = Vec::new();
    for _ in 0..17 {
        received.push(recv(&mut stream).await);
    }

    // Assert
    assert_eq!(received[1], WallMessage::PanelFeedback { panel: 2, high: true });
    assert_eq!(received[9], WallMessage::PanelLayout { panel: 2, layout: 1111 });
    assert_eq!(
        received[16],
        WallMessage::HighPanelLayout(Some(HighPanelInfo { w: 1, h: 1, x: 1, y: 0 }))
    );
}

#[tokio::test]
async fn test_feedback_reaches_every_connected_session() {
    let (addr, _running) = start_server().await;
    let mut presser = connect(addr).await;
    let mut observer = connect(addr).await;

    send(&mut presser, &WallMessage::VideoInputPress { input: 3 }).await;

    assert_eq!(
        recv(&mut observer).await,
        WallMessage::VideoInputFeedback { input: 3, active: true }
    );
    assert_eq!(
        recv(&mut presser).await,
        WallMessage::VideoInputFeedback { input: 3, active: true }
    );
}

#[tokio::test]
async fn test_state_request_reflects_earlier_presses() {
    let (addr, _running) = start_server().await;
    let mut stream = connect(addr).await;
    send(&mut stream, &WallMessage::PanelButtonPress { panel: 5 }).await;
    for _ in 0..17 {
        recv(&mut stream).await;
    }
    send(&mut stream, &WallMessage::VideoInputPress { input: 6 }).await;
    // Input lamp, then the source routed to panel 5.
    recv(&mut stream).await;
    recv(&mut stream).await;

    send(&mut stream, &WallMessage::StateRequest).await;
    let WallMessage::WallState(state) = recv(&mut stream).await else {
        panic!("expected a WallState reply");
    };

    assert_eq!(state.active_input, 6);
    assert!(state.panels[4].high);
    assert_eq!(state.panels[4].source, 6);
    assert_eq!(state.panels[4].layout, 1111);
}

#[tokio::test]
async fn test_invalid_panel_press_is_answered_with_error() {
    let (addr, _running) = start_server().await;
    let mut stream = connect(addr).await;

    send(&mut stream, &WallMessage::PanelButtonPress { panel: 42 }).await;

    let WallMessage::Error(err) = recv(&mut stream).await else {
        panic!("expected an Error reply");
    };
    assert_eq!(err.code, ErrorCode::InvalidPanel);
    assert_eq!(err.description, "invalid panel number 42: must be in the range [1, 8]");
}

#[tokio::test]
async fn test_undecodable_frame_does_not_end_the_session() {
    // Arrange: a header with an unknown message type and an empty payload.
    let (addr, _running) = start_server().await;
    let mut stream = connect(addr).await;
    let mut bogus = vec![0u8; HEADER_SIZE];
    bogus[0] = 0x01;
    bogus[1] = 0x99;

    // Act
    stream.write_all(&bogus).await.unwrap();
    let reply = recv(&mut stream).await;
    send(&mut stream, &WallMessage::Ping(7)).await;

    // Assert
    let WallMessage::Error(err) = reply else {
        panic!("expected an Error reply, got {reply:?}");
    };
    assert_eq!(err.code, ErrorCode::MalformedMessage);
    assert_eq!(recv(&mut stream).await, WallMessage::Pong(7));
}

#[tokio::test]
async fn test_late_session_snapshot_is_not_followed_by_earlier_feedback() {
    // Arrange: one surface selects panel 3 before the second connects.
    let (addr, _running) = start_server().await;
    let mut first = connect(addr).await;
    send(&mut first, &WallMessage::PanelButtonPress { panel: 3 }).await;
    for _ in 0..17 {
        recv(&mut first).await;
    }

    // Act
    let mut late = TcpStream::connect(addr).await.unwrap();
    let snapshot = recv(&mut late).await;
    send(&mut late, &WallMessage::Ping(1)).await;

    // Assert: the snapshot already holds the press, and nothing from it is replayed.
    let WallMessage::WallState(state) = snapshot else {
        panic!("expected a WallState snapshot, got {snapshot:?}");
    };
    assert!(state.panels[2].high);
    assert_eq!(recv(&mut late).await, WallMessage::Pong(1));
}
