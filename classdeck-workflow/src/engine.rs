//! Workflow state machine: generate → preview → edit → insert.
//!
//! [`Workflow::handle`] is the only entry point. It consumes one
//! [`Event`], updates the owned state and returns the [`Effect`]s the
//! dispatcher must perform. It never blocks and never touches the
//! network, so every transition is testable without a socket.
//!
//! While a request or an insertion is in flight the workflow is busy and
//! ignores everything but cancel, a new conversation, category changes
//! and settings.

use classdeck_collab::{
    Admission, ClientConfig, ConnectionState, EditDirective, InboundMessage, OutboundMessage,
    RequestKind, Requirements, SessionCorrelator,
};
use classdeck_core::{
    transform_edited, transform_payload, ContentCategory, ReviewCursor, Settings, SlideList,
    SlideRecord,
};
use serde_json::Value;

use crate::bridge::InsertError;
use crate::error::WorkflowError;
use crate::event::{Effect, Event, Intent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// Submit was refused because no content category is selected.
    AwaitingType,
    /// Generation request in flight.
    Generating,
    /// Edit request in flight; still logically in edit mode.
    Updating,
    Previewing,
    Editing,
    Inserting,
    Error,
    Success,
}

/// Identity stamped on every outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    pub user_id: String,
    pub channel_name: String,
    pub class_name: Option<String>,
}

impl From<&ClientConfig> for RequestIdentity {
    fn from(config: &ClientConfig) -> Self {
        Self {
            user_id: config.user_id.clone(),
            channel_name: config.channel_name.clone(),
            class_name: config.class_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
}

pub struct Workflow {
    phase: Phase,
    slides: SlideList,
    cursor: ReviewCursor,
    category: Option<ContentCategory>,
    correlator: SessionCorrelator,
    settings: Option<Settings>,
    identity: RequestIdentity,
    transcript: Vec<TranscriptEntry>,
    status: Option<String>,
}

impl Workflow {
    /// `settings` is `None` until the user has confirmed class settings;
    /// requests are blocked until then.
    pub fn new(identity: RequestIdentity, settings: Option<Settings>) -> Self {
        Self {
            phase: Phase::Idle,
            slides: SlideList::new(),
            cursor: ReviewCursor::default(),
            category: Some(ContentCategory::default()),
            correlator: SessionCorrelator::new(),
            settings,
            identity,
            transcript: Vec::new(),
            status: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn slides(&self) -> &SlideList {
        &self.slides
    }

    pub fn cursor(&self) -> &ReviewCursor {
        &self.cursor
    }

    /// Slide under review with its index.
    pub fn current_slide(&self) -> Option<(usize, &SlideRecord)> {
        if !self.is_reviewing() {
            return None;
        }
        let index = self.cursor.index();
        self.slides.get(index).map(|record| (index, record))
    }

    pub fn category(&self) -> Option<ContentCategory> {
        self.category
    }

    pub fn settings(&self) -> Option<&Settings> {
        self.settings.as_ref()
    }

    pub fn correlator(&self) -> &SessionCorrelator {
        &self.correlator
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Whether a request or insertion is in flight.
    pub fn is_processing(&self) -> bool {
        matches!(self.phase, Phase::Generating | Phase::Updating | Phase::Inserting)
    }

    fn is_reviewing(&self) -> bool {
        matches!(self.phase, Phase::Previewing | Phase::Editing | Phase::Updating)
    }

    pub fn handle(&mut self, event: Event, connection: ConnectionState) -> Vec<Effect> {
        match event {
            Event::User(intent) => {
                if matches!(self.phase, Phase::Error | Phase::Success) {
                    self.phase = Phase::Idle;
                }
                self.on_intent(intent, connection)
            }
            Event::MessageReceived(text) => self.on_message(&text),
            Event::SendFailed => {
                self.release_busy();
                vec![Effect::error(&WorkflowError::TransportUnavailable), Effect::Connect]
            }
            Event::Connected => Vec::new(),
            Event::ConnectionLost => {
                self.release_busy();
                vec![Effect::error(&WorkflowError::ConnectionLost)]
            }
            Event::InsertProgress { current, total } => {
                self.set_status(format!("Inserting slide {current} of {total}..."))
            }
            Event::InsertFinished(result) => self.on_insert_finished(result),
        }
    }

    // ---------------------------------------------------------------
    // User intents
    // ---------------------------------------------------------------

    fn on_intent(&mut self, intent: Intent, connection: ConnectionState) -> Vec<Effect> {
        let busy = self.is_processing();
        match intent {
            Intent::SelectCategory(category) => {
                self.category = category;
                if category.is_some() && self.phase == Phase::AwaitingType {
                    self.phase = Phase::Idle;
                }
                Vec::new()
            }
            Intent::SaveSettings(settings) => {
                let notice = Effect::info(format!("Settings saved: {}", settings.badge()));
                self.settings = Some(settings.clone());
                vec![Effect::PersistSettings(settings), notice]
            }
            Intent::Cancel => self.cancel(),
            Intent::NewConversation if self.phase != Phase::Inserting => self.new_conversation(),
            _ if busy => {
                log::debug!("Ignoring {intent:?} while busy");
                Vec::new()
            }
            Intent::Submit(text) => self.submit(text.trim(), connection),
            Intent::Next => {
                if self.is_reviewing() && !self.cursor.advance(self.slides.len()) {
                    return self.start_insert();
                }
                Vec::new()
            }
            Intent::Back => {
                if self.is_reviewing() {
                    self.cursor.retreat();
                }
                Vec::new()
            }
            Intent::Remove => self.remove_current(),
            Intent::Edit => {
                if self.phase != Phase::Previewing {
                    return Vec::new();
                }
                self.cursor.begin_edit();
                self.phase = Phase::Editing;
                self.set_status(format!(
                    "Describe what to change on slide {}...",
                    self.cursor.index() + 1
                ))
            }
            Intent::ExitEdit => {
                if self.phase == Phase::Editing {
                    self.cursor.end_edit();
                    self.phase = Phase::Previewing;
                }
                Vec::new()
            }
            Intent::Insert => self.start_insert(),
            Intent::NewConversation => Vec::new(),
        }
    }

    fn submit(&mut self, text: &str, connection: ConnectionState) -> Vec<Effect> {
        if text.is_empty() {
            return Vec::new();
        }
        let Some(settings) = self.settings.clone() else {
            return vec![
                Effect::PromptSettings,
                Effect::info("Please confirm your class settings first."),
            ];
        };
        if self.phase == Phase::Editing {
            return self.submit_edit(text, &settings, connection);
        }
        let Some(category) = self.category else {
            self.phase = Phase::AwaitingType;
            return vec![Effect::error(&WorkflowError::ValidationError)];
        };
        if connection != ConnectionState::Connected {
            return vec![Effect::error(&WorkflowError::TransportUnavailable), Effect::Connect];
        }

        let mut effects = Vec::new();
        if self.phase == Phase::Previewing && !self.slides.is_empty() {
            let notice = format!("{} not inserted", plural(self.slides.len()));
            effects.extend(self.dismiss_preview(&notice));
        }

        let conversation_id = self.correlator.begin_request();
        self.correlator.record_origin(text, Some(category));
        self.say(Speaker::User, text);
        self.phase = Phase::Generating;
        log::info!("Requesting {category} content");

        effects.push(Effect::Send(self.outbound(
            conversation_id,
            category.into(),
            text,
            &settings,
            None,
        )));
        effects.extend(self.set_status("Generating content...".to_string()));
        effects
    }

    fn submit_edit(
        &mut self,
        text: &str,
        settings: &Settings,
        connection: ConnectionState,
    ) -> Vec<Effect> {
        let Some((index, record)) = self
            .cursor
            .edit_target()
            .and_then(|i| self.slides.get(i).cloned().map(|r| (i, r)))
        else {
            return vec![Effect::error(&WorkflowError::EditRejected)];
        };
        if connection != ConnectionState::Connected {
            return vec![Effect::error(&WorkflowError::TransportUnavailable), Effect::Connect];
        }

        let conversation_id = self.correlator.begin_request();
        let session = self.correlator.session();
        let directive = EditDirective {
            slide_index: index,
            current_slide: record,
            original_request: session.original_request.clone(),
            original_type: session.original_category,
        };
        self.say(Speaker::User, &format!("Edit slide {}: {text}", index + 1));
        self.phase = Phase::Updating;

        let mut effects = vec![Effect::Send(self.outbound(
            conversation_id,
            RequestKind::Edit,
            text,
            settings,
            Some(directive),
        ))];
        effects.extend(self.set_status(format!("Updating slide {}...", index + 1)));
        effects
    }

    fn remove_current(&mut self) -> Vec<Effect> {
        if !self.is_reviewing() {
            return Vec::new();
        }
        self.slides.remove(self.cursor.index());
        if self.slides.is_empty() {
            return self.dismiss_preview("All slides removed.");
        }
        self.cursor.clamp(self.slides.len());
        Vec::new()
    }

    fn cancel(&mut self) -> Vec<Effect> {
        match self.phase {
            Phase::Generating | Phase::Updating => {
                self.correlator.cancel();
                self.phase = if self.phase == Phase::Updating {
                    Phase::Editing
                } else {
                    Phase::Idle
                };
                self.status = None;
                self.say(Speaker::Assistant, "Generation cancelled.");
                vec![Effect::info("Generation cancelled.")]
            }
            Phase::Previewing | Phase::Editing => self.dismiss_preview("Preview cancelled."),
            Phase::AwaitingType => {
                self.phase = Phase::Idle;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn start_insert(&mut self) -> Vec<Effect> {
        if self.slides.is_empty() {
            self.phase = Phase::Error;
            return vec![Effect::error(&WorkflowError::NothingToInsert)];
        }
        self.cursor.end_edit();
        self.phase = Phase::Inserting;
        let mut effects = vec![Effect::Insert(self.slides.snapshot())];
        effects.extend(self.set_status("Inserting slides...".to_string()));
        effects
    }

    fn new_conversation(&mut self) -> Vec<Effect> {
        if matches!(self.phase, Phase::Generating | Phase::Updating) {
            self.correlator.abandon();
        } else {
            self.correlator.reset();
        }
        self.slides.clear();
        self.cursor.reset();
        self.transcript.clear();
        self.status = None;
        self.phase = Phase::Idle;
        vec![Effect::info("New conversation started.")]
    }

    // ---------------------------------------------------------------
    // Inbound messages
    // ---------------------------------------------------------------

    fn on_message(&mut self, text: &str) -> Vec<Effect> {
        let message = match InboundMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                log::warn!("{}", WorkflowError::MalformedPayload(e.to_string()));
                self.release_busy();
                return Vec::new();
            }
        };
        match self.correlator.admit(&message) {
            Admission::Accept => {}
            Admission::Stale | Admission::Duplicate => return Vec::new(),
        }

        match message {
            InboundMessage::RequirementsNotMet { message } | InboundMessage::Info { message } => {
                self.release_busy();
                self.say(Speaker::Assistant, &message);
                vec![Effect::info(message)]
            }
            InboundMessage::Progress { stage, .. } => self.set_status(stage),
            InboundMessage::Edit { slide_index, slide } => self.apply_edit(slide_index, &slide),
            InboundMessage::Preview { payload } => self.apply_preview(&payload),
            InboundMessage::InsertProgress { current, total } => {
                self.set_status(format!("Inserting slide {current} of {total}..."))
            }
            InboundMessage::Success { message } => vec![Effect::success(message)],
            InboundMessage::Error { message } => self.server_error(message),
            InboundMessage::Unknown(value) => {
                log::debug!("Unhandled message: {value}");
                self.release_busy();
                Vec::new()
            }
        }
    }

    fn apply_preview(&mut self, payload: &Value) -> Vec<Effect> {
        if self.phase != Phase::Generating {
            log::debug!("Ignoring preview outside of generation");
            return Vec::new();
        }
        self.status = None;
        let category = self.correlator.session().original_category;
        let records = transform_payload(payload);
        if records.is_empty() {
            self.phase = Phase::Error;
            return vec![Effect::error(&WorkflowError::EmptyResult { category })];
        }

        let summary = ["title", "summary"]
            .iter()
            .find_map(|key| payload.get(*key).and_then(Value::as_str))
            .filter(|s| !s.is_empty())
            .unwrap_or("Generated Content")
            .to_string();
        let notice = format!("{summary}: {} ready for review", plural(records.len()));
        self.slides = records.into();
        self.cursor.reset();
        self.phase = Phase::Previewing;
        self.say(Speaker::Assistant, &notice);
        vec![Effect::info(notice)]
    }

    fn apply_edit(&mut self, slide_index: Option<usize>, slide: &Value) -> Vec<Effect> {
        if !self.is_reviewing() {
            log::debug!("Ignoring edit reply outside of review");
            return Vec::new();
        }
        self.status = None;
        let target = slide_index.filter(|&i| i < self.slides.len() && slide.is_object());
        let Some(index) = target else {
            self.release_busy();
            return vec![Effect::error(&WorkflowError::EditRejected)];
        };

        let category = self.correlator.session().original_category;
        let record = transform_edited(slide, category, self.slides.get(index));
        self.slides.replace(index, record);
        self.cursor.seek(index);
        self.phase = if self.cursor.is_editing() {
            Phase::Editing
        } else {
            Phase::Previewing
        };
        self.say(Speaker::Assistant, "Slide updated.");
        vec![Effect::info("Slide updated.")]
    }

    fn server_error(&mut self, message: String) -> Vec<Effect> {
        let err = WorkflowError::Server(message);
        if self.phase != Phase::Inserting {
            self.slides.clear();
            self.cursor.reset();
            self.status = None;
            self.phase = Phase::Error;
        }
        vec![Effect::error(&err)]
    }

    fn on_insert_finished(&mut self, result: Result<usize, InsertError>) -> Vec<Effect> {
        if self.phase != Phase::Inserting {
            return Vec::new();
        }
        self.status = None;
        self.slides.clear();
        self.cursor.reset();
        match result {
            Ok(count) => {
                self.phase = Phase::Success;
                let notice = format!("{} inserted successfully", plural(count));
                self.say(Speaker::Assistant, &notice);
                vec![Effect::success(notice)]
            }
            Err(InsertError::Empty) => {
                self.phase = Phase::Error;
                vec![Effect::error(&WorkflowError::NothingToInsert)]
            }
            Err(e) => {
                log::error!("Insertion failed: {e}");
                self.phase = Phase::Error;
                vec![Effect::error(&WorkflowError::InsertionFailure(e.to_string()))]
            }
        }
    }

    // ---------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------

    /// Drop the in-flight flag without touching the slide list.
    fn release_busy(&mut self) {
        self.status = None;
        self.phase = match self.phase {
            Phase::Generating => Phase::Idle,
            Phase::Updating => Phase::Editing,
            other => other,
        };
    }

    fn dismiss_preview(&mut self, notice: &str) -> Vec<Effect> {
        self.slides.clear();
        self.cursor.reset();
        self.phase = Phase::Idle;
        self.say(Speaker::Assistant, notice);
        vec![Effect::info(notice)]
    }

    fn set_status(&mut self, status: String) -> Vec<Effect> {
        self.status = Some(status.clone());
        vec![Effect::Status(status)]
    }

    fn say(&mut self, speaker: Speaker, text: &str) {
        self.transcript.push(TranscriptEntry {
            speaker,
            text: text.to_string(),
        });
    }

    fn outbound(
        &self,
        conversation_id: String,
        kind: RequestKind,
        text: &str,
        settings: &Settings,
        edit: Option<EditDirective>,
    ) -> OutboundMessage {
        OutboundMessage {
            user_id: self.identity.user_id.clone(),
            channel_name: self.identity.channel_name.clone(),
            conversation_id,
            kind,
            content: text.to_string(),
            requirements: Requirements::from_settings(
                settings,
                self.identity.class_name.as_deref(),
            ),
            edit,
        }
    }
}

fn plural(count: usize) -> String {
    if count == 1 {
        "1 slide".to_string()
    } else {
        format!("{count} slides")
    }
}
