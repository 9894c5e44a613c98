//! Inputs and outputs of the workflow state machine.
//!
//! Everything the workflow reacts to arrives as one [`Event`] from a
//! single ordered queue; everything it wants done comes back as a list
//! of [`Effect`]s for the dispatcher to carry out.

use classdeck_collab::OutboundMessage;
use classdeck_core::{ContentCategory, Settings, SlideRecord};

use crate::bridge::InsertError;
use crate::error::WorkflowError;

/// Something the user asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// `None` clears the selection.
    SelectCategory(Option<ContentCategory>),
    /// Free text: a generation request, or an edit instruction in edit mode.
    Submit(String),
    Next,
    Back,
    Remove,
    Edit,
    ExitEdit,
    Cancel,
    Insert,
    NewConversation,
    SaveSettings(Settings),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    User(Intent),
    /// Raw text frame from the server or host surface.
    MessageReceived(String),
    /// A `Send` effect could not be delivered.
    SendFailed,
    Connected,
    ConnectionLost,
    InsertProgress { current: usize, total: usize },
    InsertFinished(Result<usize, InsertError>),
}

impl From<Intent> for Event {
    fn from(intent: Intent) -> Self {
        Event::User(intent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Ask the supervisor to (re)connect.
    Connect,
    Send(OutboundMessage),
    /// Hand a snapshot of the slide list to the presentation collaborator.
    Insert(Vec<SlideRecord>),
    Notice { level: NoticeLevel, text: String },
    /// Progress label; replaces the previous one.
    Status(String),
    /// Settings are missing; block until the user saves some.
    PromptSettings,
    PersistSettings(Settings),
}

impl Effect {
    pub fn info(text: impl Into<String>) -> Self {
        Effect::Notice {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Effect::Notice {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(err: &WorkflowError) -> Self {
        Effect::Notice {
            level: NoticeLevel::Error,
            text: err.to_string(),
        }
    }
}
