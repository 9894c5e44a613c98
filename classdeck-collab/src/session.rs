//! Session correlation and staleness suppression.
//!
//! A conversation is one run of generate/edit requests sharing a
//! conversation id. Cancelling a request bumps `stale_count`; that many
//! later non-progress replies are swallowed. Progress notifications are
//! always admitted so the user keeps seeing feedback. Independently, a
//! preview identical to the previously accepted one is dropped as a
//! duplicate delivery.

use classdeck_core::ContentCategory;
use uuid::Uuid;

use crate::protocol::InboundMessage;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub session_id: Option<String>,
    pub original_request: String,
    pub original_category: Option<ContentCategory>,
}

/// Verdict on an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accept,
    /// Reply to a cancelled request.
    Stale,
    /// Repeat delivery of the last accepted preview.
    Duplicate,
}

#[derive(Debug, Default)]
pub struct SessionCorrelator {
    session: Session,
    stale_count: u32,
    last_preview_key: Option<String>,
}

impl SessionCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current conversation id, creating one if none is active.
    pub fn begin_session(&mut self) -> String {
        self.session
            .session_id
            .get_or_insert_with(|| format!("conv-{}", Uuid::new_v4().simple()))
            .clone()
    }

    pub fn current_session(&self) -> Option<&str> {
        self.session.session_id.as_deref()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Stamp a new outbound request: returns the conversation id and
    /// forgets the last preview so a legitimately repeated deck is shown.
    pub fn begin_request(&mut self) -> String {
        self.last_preview_key = None;
        self.begin_session()
    }

    /// Remember the request that produced the current deck, so later
    /// edits can refer back to it.
    pub fn record_origin(&mut self, request: &str, category: Option<ContentCategory>) {
        self.session.original_request = request.to_string();
        self.session.original_category = category;
    }

    /// Explicit new conversation: fresh id on next request, nothing stale.
    pub fn reset(&mut self) {
        self.session = Session::default();
        self.stale_count = 0;
        self.last_preview_key = None;
    }

    /// New conversation while a request is still in flight. Its reply,
    /// and any still owed to earlier cancels, stay stale.
    pub fn abandon(&mut self) {
        let owed = self.stale_count + 1;
        self.reset();
        self.stale_count = owed;
        log::debug!("Conversation reset with {owed} reply(ies) outstanding");
    }

    /// Abandon the in-flight request.
    pub fn cancel(&mut self) {
        self.stale_count += 1;
        self.session.session_id = None;
        log::debug!("Request cancelled, stale count {}", self.stale_count);
    }

    pub fn stale_count(&self) -> u32 {
        self.stale_count
    }

    pub fn admit(&mut self, message: &InboundMessage) -> Admission {
        if message.is_progress() {
            return Admission::Accept;
        }
        if self.stale_count > 0 {
            self.stale_count -= 1;
            log::debug!("Dropped stale reply, {} remaining", self.stale_count);
            return Admission::Stale;
        }
        if let Some(key) = message.preview_key() {
            if self.last_preview_key.as_deref() == Some(key.as_str()) {
                log::debug!("Duplicate preview ignored");
                return Admission::Duplicate;
            }
            self.last_preview_key = Some(key);
        }
        Admission::Accept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn preview(titles: &[&str]) -> InboundMessage {
        let slides: Vec<_> = titles.iter().map(|t| json!({"title": t})).collect();
        InboundMessage::classify(json!({"type": "preview", "slides": slides}))
    }

    fn progress() -> InboundMessage {
        InboundMessage::classify(json!({"type": "progress", "stage": "working"}))
    }

    #[test]
    fn test_session_id_is_stable() {
        let mut sc = SessionCorrelator::new();
        assert!(sc.current_session().is_none());
        let id = sc.begin_session();
        assert!(id.starts_with("conv-"));
        assert_eq!(sc.begin_request(), id);
        assert_eq!(sc.current_session(), Some(id.as_str()));
    }

    #[test]
    fn test_abandon_keeps_outstanding_replies_stale() {
        let mut sc = SessionCorrelator::new();
        let first = sc.begin_request();
        sc.cancel();
        sc.begin_request();
        sc.abandon();
        assert_eq!(sc.stale_count(), 2);
        assert!(sc.current_session().is_none());
        assert_ne!(sc.begin_request(), first);

        assert_eq!(sc.admit(&preview(&["old"])), Admission::Stale);
        assert_eq!(sc.admit(&preview(&["older"])), Admission::Stale);
        assert_eq!(sc.admit(&preview(&["fresh"])), Admission::Accept);
    }

    #[test]
    fn test_cancel_swallows_exactly_one_reply() {
        let mut sc = SessionCorrelator::new();
        let id = sc.begin_request();
        sc.cancel();
        assert!(sc.current_session().is_none());

        assert_eq!(sc.admit(&progress()), Admission::Accept);
        assert_eq!(sc.stale_count(), 1);
        assert_eq!(sc.admit(&preview(&["Old"])), Admission::Stale);
        assert_eq!(sc.stale_count(), 0);
        assert_eq!(sc.admit(&preview(&["New"])), Admission::Accept);

        assert_ne!(sc.begin_request(), id);
    }

    #[test]
    fn test_duplicate_preview_does_not_touch_stale_count() {
        let mut sc = SessionCorrelator::new();
        assert_eq!(sc.admit(&preview(&["A", "B"])), Admission::Accept);
        assert_eq!(sc.admit(&preview(&["A", "B"])), Admission::Duplicate);
        assert_eq!(sc.stale_count(), 0);
        assert_eq!(sc.admit(&preview(&["A", "C"])), Admission::Accept);
    }

    #[test]
    fn test_new_request_forgets_preview() {
        let mut sc = SessionCorrelator::new();
        sc.admit(&preview(&["A"]));
        sc.begin_request();
        assert_eq!(sc.admit(&preview(&["A"])), Admission::Accept);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut sc = SessionCorrelator::new();
        sc.begin_request();
        sc.record_origin("5 words", Some(ContentCategory::Vocabulary));
        sc.cancel();
        sc.cancel();
        sc.reset();
        assert_eq!(sc.stale_count(), 0);
        assert_eq!(sc.session(), &Session::default());
    }
}
