//! In-process host channel.
//!
//! The hosting surface (a review dialog, a parent window) relays the same
//! JSON messages as the server, so it is modelled as another
//! [`Transport`]. The client side holds a [`HostChannel`]; the surface
//! side holds a [`HostEndpoint`] that sees what the client posts and can
//! deliver messages back, including the repeated deliveries real hosts
//! are known to produce.

use tokio::sync::mpsc;

use crate::transport::{Transport, TransportEvent, NORMAL_CLOSURE};

/// What the client asked of the host surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEnvelope {
    Open,
    Message(String),
    Close,
}

pub struct HostChannel {
    to_host: mpsc::UnboundedSender<HostEnvelope>,
    events: mpsc::UnboundedSender<TransportEvent>,
    open: bool,
}

pub struct HostEndpoint {
    inbox: mpsc::UnboundedReceiver<HostEnvelope>,
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl HostChannel {
    /// Create a connected channel/endpoint pair. Transport events for the
    /// client are delivered on `events`.
    pub fn pair(events: mpsc::UnboundedSender<TransportEvent>) -> (HostChannel, HostEndpoint) {
        let (to_host, inbox) = mpsc::unbounded_channel();
        let channel = HostChannel {
            to_host,
            events: events.clone(),
            open: false,
        };
        (channel, HostEndpoint { inbox, events })
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl Transport for HostChannel {
    fn open(&mut self) {
        if self.to_host.send(HostEnvelope::Open).is_ok() {
            self.open = true;
            let _ = self.events.send(TransportEvent::Opened);
        } else {
            let _ = self.events.send(TransportEvent::Error("host surface gone".to_string()));
            let _ = self.events.send(TransportEvent::Closed { code: None });
        }
    }

    fn send(&mut self, text: String) -> bool {
        self.open && self.to_host.send(HostEnvelope::Message(text)).is_ok()
    }

    fn close(&mut self, _code: u16, _reason: &str) {
        if self.open {
            self.open = false;
            let _ = self.to_host.send(HostEnvelope::Close);
        }
    }
}

impl HostEndpoint {
    /// Next envelope posted by the client.
    pub async fn recv(&mut self) -> Option<HostEnvelope> {
        self.inbox.recv().await
    }

    pub fn try_recv(&mut self) -> Option<HostEnvelope> {
        self.inbox.try_recv().ok()
    }

    /// Relay a message to the client.
    pub fn deliver(&self, text: impl Into<String>) -> bool {
        self.events.send(TransportEvent::Message(text.into())).is_ok()
    }

    /// The user closed the surface.
    pub fn dismiss(&self) {
        let _ = self.events.send(TransportEvent::Closed {
            code: Some(NORMAL_CLOSURE),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::InboundMessage;
    use crate::session::{Admission, SessionCorrelator};
    use crate::supervisor::{
        ConnectionState, ReconnectPolicy, ReconnectSupervisor, SupervisorSignal,
    };

    #[tokio::test]
    async fn test_host_round_trip() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (channel, mut endpoint) = HostChannel::pair(tx);
        let mut sup = ReconnectSupervisor::new(channel, ReconnectPolicy::default());

        sup.connect();
        assert_eq!(endpoint.recv().await, Some(HostEnvelope::Open));
        let opened = rx.recv().await.unwrap();
        assert_eq!(sup.handle(opened), Some(SupervisorSignal::Connected));
        assert_eq!(sup.state(), ConnectionState::Connected);

        assert!(sup.send("{\"type\":\"vocabulary\"}".to_string()));
        assert!(matches!(endpoint.recv().await, Some(HostEnvelope::Message(_))));

        endpoint.dismiss();
        let closed = rx.recv().await.unwrap();
        assert!(matches!(sup.handle(closed), Some(SupervisorSignal::Disconnected { .. })));
    }

    #[tokio::test]
    async fn test_double_delivery_is_deduplicated() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (channel, endpoint) = HostChannel::pair(tx);
        let mut sup = ReconnectSupervisor::new(channel, ReconnectPolicy::default());
        let mut correlator = SessionCorrelator::new();
        sup.connect();
        sup.handle(rx.recv().await.unwrap());

        let preview = r#"{"type":"preview","slides":[{"type":"Title","title":"Food"}],"summary":"Food"}"#;
        endpoint.deliver(preview);
        endpoint.deliver(preview);

        let mut verdicts = Vec::new();
        for _ in 0..2 {
            if let Some(SupervisorSignal::Message(text)) = sup.handle(rx.recv().await.unwrap()) {
                let msg = InboundMessage::parse(&text).unwrap();
                verdicts.push(correlator.admit(&msg));
            }
        }
        assert_eq!(verdicts, vec![Admission::Accept, Admission::Duplicate]);
    }
}
