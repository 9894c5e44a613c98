//! Transport connection: one persistent text channel to a single peer.
//!
//! A [`Transport`] never blocks the caller. `open()` starts a connection
//! attempt and every outcome comes back later as a [`TransportEvent`] on
//! the channel handed to the transport at construction, so the event
//! dispatcher sees socket activity in the same ordered queue as user
//! input and timers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

/// Close code for an intentional, normal closure.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Events emitted by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Message(String),
    /// `code` is `None` when the connection dropped without a close frame.
    Closed { code: Option<u16> },
    Error(String),
    /// There is nothing to dial; retrying cannot help.
    Unconfigured,
}

pub trait Transport {
    /// Start opening the connection.
    fn open(&mut self);
    /// Queue a text frame. Returns `false` if there is no open channel.
    fn send(&mut self, text: String) -> bool;
    /// Close the connection with `code`. Events of the closed connection
    /// are no longer delivered.
    fn close(&mut self, code: u16, reason: &str);
}

enum Outgoing {
    Text(String),
    Close(u16, String),
}

/// WebSocket transport over tokio-tungstenite.
///
/// Each `open()` spawns a connection task owning the socket: a writer
/// half fed by an unbounded channel and a reader half forwarding frames
/// as events. Every connection is stamped with an epoch; bumping the
/// epoch on `open`/`close` silences tasks of superseded connections.
pub struct WsTransport {
    url: Option<String>,
    events: mpsc::UnboundedSender<TransportEvent>,
    outgoing: Option<mpsc::UnboundedSender<Outgoing>>,
    epoch: Arc<AtomicU64>,
}

impl WsTransport {
    pub fn new(url: Option<String>, events: mpsc::UnboundedSender<TransportEvent>) -> Self {
        Self {
            url,
            events,
            outgoing: None,
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

impl Transport for WsTransport {
    fn open(&mut self) {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let Some(url) = self.url.clone() else {
            log::warn!("WebSocket URL not configured");
            let _ = self.events.send(TransportEvent::Unconfigured);
            return;
        };

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        self.outgoing = Some(out_tx);
        let events = self.events.clone();
        let current = self.epoch.clone();
        tokio::spawn(run_connection(url, epoch, current, events, out_rx));
    }

    fn send(&mut self, text: String) -> bool {
        match &self.outgoing {
            Some(tx) => tx.send(Outgoing::Text(text)).is_ok(),
            None => false,
        }
    }

    fn close(&mut self, code: u16, reason: &str) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(tx) = self.outgoing.take() {
            let _ = tx.send(Outgoing::Close(code, reason.to_string()));
        }
    }
}

async fn run_connection(
    url: String,
    epoch: u64,
    current: Arc<AtomicU64>,
    events: mpsc::UnboundedSender<TransportEvent>,
    mut out_rx: mpsc::UnboundedReceiver<Outgoing>,
) {
    let emit = |event: TransportEvent| {
        if current.load(Ordering::SeqCst) == epoch {
            let _ = events.send(event);
        }
    };

    let ws_stream = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((stream, _)) => stream,
        Err(e) => {
            emit(TransportEvent::Error(e.to_string()));
            emit(TransportEvent::Closed { code: None });
            return;
        }
    };
    log::info!("Connected to {url}");
    emit(TransportEvent::Opened);

    let (mut ws_writer, mut ws_reader) = ws_stream.split();

    // Writer task: forward the outgoing channel to the socket
    let writer = tokio::spawn(async move {
        while let Some(out) = out_rx.recv().await {
            let result = match out {
                Outgoing::Text(text) => ws_writer.send(Message::text(text)).await,
                Outgoing::Close(code, reason) => {
                    let frame = CloseFrame {
                        code: CloseCode::from(code),
                        reason: reason.into(),
                    };
                    let _ = ws_writer.send(Message::Close(Some(frame))).await;
                    break;
                }
            };
            if result.is_err() {
                break;
            }
        }
    });

    let mut code = None;
    while let Some(msg) = ws_reader.next().await {
        match msg {
            Ok(Message::Text(text)) => emit(TransportEvent::Message(text.as_str().to_owned())),
            Ok(Message::Close(frame)) => {
                code = frame.map(|f| u16::from(f.code));
                break;
            }
            Err(e) => {
                emit(TransportEvent::Error(e.to_string()));
                break;
            }
            _ => {}
        }
    }

    writer.abort();
    emit(TransportEvent::Closed { code });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_url_reports_unconfigured() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut transport = WsTransport::new(None, tx);
        transport.open();

        assert_eq!(rx.recv().await, Some(TransportEvent::Unconfigured));
        assert!(rx.try_recv().is_err());
        assert!(!transport.send("hello".to_string()));
    }

    #[tokio::test]
    async fn test_refused_connection_reports_closed() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut transport = WsTransport::new(Some(format!("ws://127.0.0.1:{port}")), tx);
        transport.open();

        assert!(matches!(rx.recv().await, Some(TransportEvent::Error(_))));
        assert_eq!(rx.recv().await, Some(TransportEvent::Closed { code: None }));
    }
}
