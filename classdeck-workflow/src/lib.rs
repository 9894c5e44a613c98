//! # classdeck-workflow: review workflow for generated slides
//!
//! ```text
//!  QueueEvent ──▸ Dispatcher ──Event──▸ Workflow ──Effect──▸ Dispatcher
//!                    │                                          │
//!                    ├─ ReconnectSupervisor (send / connect)    │
//!                    ├─ PresentationCollaborator (insert) ◂─────┤
//!                    └─ SettingsStore (persist) ◂───────────────┘
//! ```
//!
//! - [`engine`]: the state machine (Idle → Generating → Previewing ⇄ Editing → Inserting)
//! - [`event`]: intents, events and effects
//! - [`bridge`]: insertion plan and presentation collaborator interface
//! - [`dispatch`]: single ordered event queue wiring everything together
//! - [`error`]: user-facing failures

pub mod bridge;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod event;

pub use bridge::{
    insert_slides, plan_slide, CollaboratorError, DeckCollaborator, InsertError, InsertStep,
    PresentationCollaborator, TextRegion,
};
pub use dispatch::{Dispatcher, QueueEvent};
pub use engine::{Phase, RequestIdentity, Speaker, TranscriptEntry, Workflow};
pub use error::WorkflowError;
pub use event::{Effect, Event, Intent, NoticeLevel};
