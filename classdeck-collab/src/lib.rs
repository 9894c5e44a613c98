//! # classdeck-collab: connection and protocol layer for classdeck
//!
//! Talks to the slide-generation server over a persistent WebSocket and
//! to the hosting surface over an in-process channel.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐   TransportEvent   ┌─────────────────────┐
//! │ WsTransport /        │ ─────────────────► │ ReconnectSupervisor │
//! │ HostChannel          │ ◄───────────────── │ (bounded retries)   │
//! └──────────────────────┘      send()        └──────────┬──────────┘
//!                                                        │ Message(text)
//!                                                        ▼
//!                                             ┌─────────────────────┐
//!                                             │ InboundMessage      │
//!                                             │ SessionCorrelator   │
//!                                             │ (stale / duplicate) │
//!                                             └─────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`protocol`]: JSON wire messages
//! - [`transport`]: transport trait and WebSocket implementation
//! - [`supervisor`]: connection state and reconnection policy
//! - [`session`]: conversation ids, stale-reply suppression, preview dedup
//! - [`host`]: in-process host surface channel
//! - [`config`]: client configuration
//! - [`storage`]: persisted class settings

pub mod config;
pub mod host;
pub mod protocol;
pub mod session;
pub mod storage;
pub mod supervisor;
pub mod transport;

pub use config::ClientConfig;
pub use host::{HostChannel, HostEndpoint, HostEnvelope};
pub use protocol::{
    EditDirective, InboundMessage, OutboundMessage, ProtocolError, RequestKind, Requirements,
};
pub use session::{Admission, Session, SessionCorrelator};
pub use storage::{JsonFileSettingsStore, MemorySettingsStore, SettingsStore, StoreError};
pub use supervisor::{ConnectionState, ReconnectPolicy, ReconnectSupervisor, SupervisorSignal};
pub use transport::{Transport, TransportEvent, WsTransport, NORMAL_CLOSURE};
