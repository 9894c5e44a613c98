//! End-to-end tests against a local WebSocket peer.
//!
//! Each test starts a real tokio-tungstenite server on a free port and
//! drives a real `WsTransport` through the reconnection supervisor.

use classdeck_collab::{
    ConnectionState, InboundMessage, OutboundMessage, ReconnectPolicy, ReconnectSupervisor,
    RequestKind, Requirements, SupervisorSignal, TransportEvent, WsTransport,
};
use classdeck_core::{transform_payload, ContentCategory, Settings};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::tungstenite::Message;

/// Start a peer that answers every request with a vocabulary deck.
async fn start_echo_server() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                while let Some(Ok(msg)) = ws.next().await {
                    let Message::Text(text) = msg else { continue };
                    let request = OutboundMessage::decode(text.as_str()).unwrap();
                    let progress = json!({"type": "progress", "stage": "Generating"});
                    let reply = json!({
                        "title": format!("Reply to {}", request.content),
                        "words": [
                            {"word": "der Apfel", "translation": "the apple"},
                            {"word": "das Brot", "translation": "the bread"}
                        ]
                    });
                    let _ = ws.send(Message::text(progress.to_string())).await;
                    let _ = ws.send(Message::text(reply.to_string())).await;
                }
            });
        }
    });
    port
}

/// Start a peer that accepts the handshake and then drops the socket.
async fn start_dropping_server() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            if let Ok(ws) = tokio_tungstenite::accept_async(stream).await {
                drop(ws);
            }
        }
    });
    port
}

async fn next_signal(
    sup: &mut ReconnectSupervisor<WsTransport>,
    rx: &mut mpsc::UnboundedReceiver<TransportEvent>,
) -> SupervisorSignal {
    loop {
        let event = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("transport event within timeout")
            .expect("event channel open");
        if let Some(signal) = sup.handle(event) {
            return signal;
        }
    }
}

fn request(content: &str) -> OutboundMessage {
    OutboundMessage {
        user_id: "user-123".to_string(),
        channel_name: "powerpoint-taskpane".to_string(),
        conversation_id: "conv-test".to_string(),
        kind: RequestKind::from(ContentCategory::Vocabulary),
        content: content.to_string(),
        requirements: Requirements::from_settings(&Settings::default(), None),
        edit: None,
    }
}

#[tokio::test]
async fn test_request_reply_through_supervisor() {
    let port = start_echo_server().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let transport = WsTransport::new(Some(format!("ws://127.0.0.1:{port}")), tx);
    let mut sup = ReconnectSupervisor::new(transport, ReconnectPolicy::default());

    assert!(sup.connect());
    assert_eq!(next_signal(&mut sup, &mut rx).await, SupervisorSignal::Connected);
    assert_eq!(sup.state(), ConnectionState::Connected);

    sup.send_message(&request("food")).unwrap();

    let SupervisorSignal::Message(text) = next_signal(&mut sup, &mut rx).await else {
        panic!("expected progress message");
    };
    assert!(InboundMessage::parse(&text).unwrap().is_progress());

    let SupervisorSignal::Message(text) = next_signal(&mut sup, &mut rx).await else {
        panic!("expected preview message");
    };
    let InboundMessage::Preview { payload } = InboundMessage::parse(&text).unwrap() else {
        panic!("expected preview");
    };
    let slides = transform_payload(&payload);
    assert_eq!(slides.len(), 3);
    assert_eq!(slides[0].title, "Reply to food");

    sup.close();
    assert_eq!(sup.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_dropped_connection_schedules_retry() {
    let port = start_dropping_server().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let transport = WsTransport::new(Some(format!("ws://127.0.0.1:{port}")), tx);
    let mut sup = ReconnectSupervisor::new(
        transport,
        ReconnectPolicy {
            max_attempts: 1,
            base_delay: Duration::from_millis(10),
        },
    );

    sup.connect();
    assert_eq!(next_signal(&mut sup, &mut rx).await, SupervisorSignal::Connected);
    let token = match next_signal(&mut sup, &mut rx).await {
        SupervisorSignal::RetryScheduled { attempt: 1, token, .. } => token,
        other => panic!("expected retry, got {other:?}"),
    };

    assert!(sup.on_timer(token));
    assert_eq!(next_signal(&mut sup, &mut rx).await, SupervisorSignal::Connected);
    assert_eq!(next_signal(&mut sup, &mut rx).await, SupervisorSignal::RetryScheduled {
        attempt: 1,
        delay: Duration::from_millis(10),
        token: token + 1,
    });
}

#[tokio::test]
async fn test_unreachable_server_gives_up() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let transport = WsTransport::new(Some(format!("ws://127.0.0.1:{port}")), tx);
    let mut sup = ReconnectSupervisor::new(
        transport,
        ReconnectPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
        },
    );

    sup.connect();
    let mut retries = 0;
    loop {
        match next_signal(&mut sup, &mut rx).await {
            SupervisorSignal::RetryScheduled { token, .. } => {
                retries += 1;
                sup.on_timer(token);
            }
            SupervisorSignal::ConnectionLost => break,
            other => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(retries, 2);
    assert!(sup.send_message(&request("late")).is_err());
}
