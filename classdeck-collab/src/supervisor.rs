//! Reconnection supervisor.
//!
//! Wraps a [`Transport`] and owns the connection state. Transport events
//! go in through [`ReconnectSupervisor::handle`]; what the caller must do
//! about them comes out as a [`SupervisorSignal`]. The supervisor never
//! sleeps itself: a scheduled retry is returned with a timer token, the
//! caller arms a timer and hands the token back via
//! [`ReconnectSupervisor::on_timer`]. Stale tokens are ignored, which is
//! how an intentional close halts a pending reconnect.

use std::time::Duration;

use crate::protocol::{OutboundMessage, ProtocolError};
use crate::transport::{Transport, TransportEvent, NORMAL_CLOSURE};

/// Client connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Bounded linear backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(2000),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// What the caller has to act on after a transport event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorSignal {
    Connected,
    Message(String),
    /// Arm a timer for `delay`, then call `on_timer(token)`.
    RetryScheduled { attempt: u32, delay: Duration, token: u64 },
    /// Closed without a retry (intentional closure, or nothing to dial).
    Disconnected { code: Option<u16> },
    /// Retry budget exhausted; only an explicit `connect()` starts over.
    ConnectionLost,
}

pub struct ReconnectSupervisor<T: Transport> {
    transport: T,
    state: ConnectionState,
    policy: ReconnectPolicy,
    attempts: u32,
    next_token: u64,
    pending_timer: Option<u64>,
    gave_up: bool,
}

impl<T: Transport> ReconnectSupervisor<T> {
    pub fn new(transport: T, policy: ReconnectPolicy) -> Self {
        Self {
            transport,
            state: ConnectionState::Disconnected,
            policy,
            attempts: 0,
            next_token: 0,
            pending_timer: None,
            gave_up: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Reconnect attempts made since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn has_given_up(&self) -> bool {
        self.gave_up
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Start connecting. No-op while connecting or connected; returns
    /// whether an attempt was started.
    pub fn connect(&mut self) -> bool {
        if self.state != ConnectionState::Disconnected {
            return false;
        }
        if self.gave_up {
            self.gave_up = false;
            self.attempts = 0;
        }
        self.pending_timer = None;
        self.state = ConnectionState::Connecting;
        self.transport.open();
        true
    }

    pub fn handle(&mut self, event: TransportEvent) -> Option<SupervisorSignal> {
        match event {
            TransportEvent::Opened => {
                self.state = ConnectionState::Connected;
                self.attempts = 0;
                self.gave_up = false;
                Some(SupervisorSignal::Connected)
            }
            TransportEvent::Message(text) => Some(SupervisorSignal::Message(text)),
            TransportEvent::Error(e) => {
                log::warn!("Transport error: {e}");
                None
            }
            TransportEvent::Unconfigured => {
                self.state = ConnectionState::Disconnected;
                self.pending_timer = None;
                Some(SupervisorSignal::Disconnected { code: None })
            }
            TransportEvent::Closed { code } => {
                self.state = ConnectionState::Disconnected;
                log::info!("Connection closed (code {code:?})");
                if code == Some(NORMAL_CLOSURE) {
                    return Some(SupervisorSignal::Disconnected { code });
                }
                if self.attempts < self.policy.max_attempts {
                    self.attempts += 1;
                    self.next_token += 1;
                    let token = self.next_token;
                    self.pending_timer = Some(token);
                    let delay = self.policy.delay_for(self.attempts);
                    log::info!(
                        "Reconnecting in {}ms (attempt {}/{})",
                        delay.as_millis(),
                        self.attempts,
                        self.policy.max_attempts
                    );
                    Some(SupervisorSignal::RetryScheduled {
                        attempt: self.attempts,
                        delay,
                        token,
                    })
                } else {
                    log::error!("Giving up after {} reconnect attempts", self.attempts);
                    self.gave_up = true;
                    Some(SupervisorSignal::ConnectionLost)
                }
            }
        }
    }

    /// A retry timer fired. Returns whether a reconnect was started.
    pub fn on_timer(&mut self, token: u64) -> bool {
        if self.pending_timer != Some(token) {
            return false;
        }
        self.pending_timer = None;
        self.connect()
    }

    /// Send raw text. Fails fast unless connected.
    pub fn send(&mut self, text: String) -> bool {
        self.state == ConnectionState::Connected && self.transport.send(text)
    }

    pub fn send_message(&mut self, message: &OutboundMessage) -> Result<(), ProtocolError> {
        let encoded = message.encode()?;
        if self.send(encoded) {
            Ok(())
        } else {
            Err(ProtocolError::NotConnected)
        }
    }

    /// Intentional close. Cancels any pending reconnect.
    pub fn close(&mut self) {
        self.pending_timer = None;
        if self.state != ConnectionState::Disconnected {
            self.transport.close(NORMAL_CLOSURE, "Component unmounting");
        }
        self.state = ConnectionState::Disconnected;
    }
}
