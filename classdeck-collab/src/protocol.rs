//! JSON wire protocol.
//!
//! One JSON object per text frame in each direction. Outbound requests
//! are strongly typed; inbound messages are duck-typed by the peer, so
//! they are parsed as [`serde_json::Value`] and classified by field
//! presence into [`InboundMessage`].

use classdeck_core::{ContentCategory, Settings, SlideRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Request `type` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Vocabulary,
    Grammar,
    Quiz,
    Homework,
    Edit,
}

impl From<ContentCategory> for RequestKind {
    fn from(category: ContentCategory) -> Self {
        match category {
            ContentCategory::Vocabulary => Self::Vocabulary,
            ContentCategory::Grammar => Self::Grammar,
            ContentCategory::Quiz => Self::Quiz,
            ContentCategory::Homework => Self::Homework,
        }
    }
}

/// Class requirements sent with every request. Any field may be null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Requirements {
    pub language: Option<String>,
    pub level: Option<String>,
    pub native_language: Option<String>,
    pub age_group: Option<String>,
    pub class_name: Option<String>,
}

impl Requirements {
    /// Native language falls back to `"No"`; empty strings go out as null.
    pub fn from_settings(settings: &Settings, class_name: Option<&str>) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            language: non_empty(&settings.language),
            level: non_empty(&settings.level),
            native_language: Some(
                non_empty(&settings.native_language).unwrap_or_else(|| "No".to_string()),
            ),
            age_group: non_empty(&settings.age_group),
            class_name: class_name.and_then(non_empty),
        }
    }
}

/// Anchor for an edit request: which slide, what it currently holds and
/// the request that produced the deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditDirective {
    pub slide_index: usize,
    pub current_slide: SlideRecord,
    pub original_request: String,
    pub original_type: Option<ContentCategory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    #[serde(rename = "user-id")]
    pub user_id: String,
    #[serde(rename = "channel-name")]
    pub channel_name: String,
    #[serde(rename = "conversation-id")]
    pub conversation_id: String,
    #[serde(rename = "type")]
    pub kind: RequestKind,
    pub content: String,
    pub requirements: Requirements,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit: Option<EditDirective>,
}

impl OutboundMessage {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Serialization)
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Deserialization)
    }
}

/// Classified inbound message, in handling priority order.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// The request lacked information the server needs.
    RequirementsNotMet { message: String },
    /// Status update. Never changes workflow state.
    Progress { stage: String, percent: Option<f64> },
    /// Single-slide replacement for an edit request.
    Edit { slide_index: Option<usize>, slide: Value },
    /// Full deck payload; shape decided by the transformation layer.
    Preview { payload: Value },
    /// Host-side insertion progress.
    InsertProgress { current: usize, total: usize },
    Success { message: String },
    Error { message: String },
    Info { message: String },
    Unknown(Value),
}

const PREVIEW_ARRAYS: [&str; 5] = ["slides", "words", "questions", "tasks", "data"];

impl InboundMessage {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text).map_err(ProtocolError::Deserialization)?;
        Ok(Self::classify(value))
    }

    pub fn classify(value: Value) -> Self {
        let kind = value.get("type").and_then(Value::as_str).unwrap_or_default();
        let string = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        if let Some(message) = string("requirements-not-met") {
            return Self::RequirementsNotMet { message };
        }
        if kind == "progress" {
            return Self::Progress {
                stage: string("stage").or_else(|| string("message")).unwrap_or_default(),
                percent: value.get("percent").and_then(Value::as_f64),
            };
        }
        if kind == "edit" {
            if let Some(edit) = value.get("edit").filter(|e| e.is_object()) {
                return Self::Edit {
                    slide_index: edit
                        .get("slideIndex")
                        .and_then(Value::as_u64)
                        .and_then(|i| usize::try_from(i).ok()),
                    slide: edit.get("slide").cloned().unwrap_or(Value::Null),
                };
            }
        }
        if kind == "preview" || PREVIEW_ARRAYS.iter().any(|key| value.get(*key).is_some()) {
            return Self::Preview { payload: value };
        }
        match kind {
            "insertProgress" => {
                let count = |key: &str| {
                    value
                        .get(key)
                        .and_then(Value::as_u64)
                        .and_then(|n| usize::try_from(n).ok())
                        .unwrap_or_default()
                };
                return Self::InsertProgress {
                    current: count("current"),
                    total: count("total"),
                };
            }
            "success" => {
                return Self::Success {
                    message: string("message").unwrap_or_default(),
                }
            }
            "error" => {
                return Self::Error {
                    message: string("error")
                        .or_else(|| string("message"))
                        .unwrap_or_else(|| "Unknown error".to_string()),
                }
            }
            _ => {}
        }
        if let Some(message) = string("error") {
            return Self::Error { message };
        }
        if let Some(message) = string("message") {
            return Self::Info { message };
        }
        Self::Unknown(value)
    }

    pub fn is_progress(&self) -> bool {
        matches!(self, Self::Progress { .. })
    }

    /// Dedup key of a preview: its slide-title sequence serialized as JSON.
    pub fn preview_key(&self) -> Option<String> {
        let Self::Preview { payload } = self else {
            return None;
        };
        let items = PREVIEW_ARRAYS
            .iter()
            .find_map(|key| payload.get(*key).and_then(Value::as_array));
        let titles: Vec<Value> = items
            .map(|items| {
                items
                    .iter()
                    .map(|item| {
                        ["slide-title", "title", "word", "question"]
                            .iter()
                            .find_map(|key| item.get(*key).cloned())
                            .unwrap_or(Value::Null)
                    })
                    .collect()
            })
            .unwrap_or_default();
        let header = payload.get("title").cloned().unwrap_or(Value::Null);
        Some(Value::Array(vec![header, Value::Array(titles)]).to_string())
    }
}

/// Protocol errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),
    #[error("Deserialization error: {0}")]
    Deserialization(#[source] serde_json::Error),
    #[error("Not connected")]
    NotConnected,
}

#[cfg(test)]
mod tests {
    use super::*;
    use classdeck_core::SlideKind;
    use serde_json::json;

    fn outbound(edit: Option<EditDirective>) -> OutboundMessage {
        OutboundMessage {
            user_id: "user-123".to_string(),
            channel_name: "powerpoint-taskpane".to_string(),
            conversation_id: "conv-1".to_string(),
            kind: if edit.is_some() {
                RequestKind::Edit
            } else {
                RequestKind::Vocabulary
            },
            content: "5 German food words".to_string(),
            requirements: Requirements::from_settings(&Settings::default(), None),
            edit,
        }
    }

    #[test]
    fn test_outbound_wire_shape() {
        let json: Value = serde_json::from_str(&outbound(None).encode().unwrap()).unwrap();
        assert_eq!(json["user-id"], "user-123");
        assert_eq!(json["conversation-id"], "conv-1");
        assert_eq!(json["type"], "vocabulary");
        assert_eq!(json["requirements"]["native-language"], "No");
        assert_eq!(json["requirements"]["age-group"], Value::Null);
        assert_eq!(json["requirements"]["class-name"], Value::Null);
        assert!(json.get("edit").is_none());
    }

    #[test]
    fn test_outbound_edit_directive() {
        let directive = EditDirective {
            slide_index: 2,
            current_slide: SlideRecord::new(SlideKind::Vocabulary, "das Brot"),
            original_request: "5 German food words".to_string(),
            original_type: Some(ContentCategory::Vocabulary),
        };
        let encoded = outbound(Some(directive)).encode().unwrap();
        let json: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(json["type"], "edit");
        assert_eq!(json["edit"]["slideIndex"], 2);
        assert_eq!(json["edit"]["currentSlide"]["title"], "das Brot");
        assert_eq!(json["edit"]["originalType"], "vocabulary");
    }

    #[test]
    fn test_classify_priority() {
        let msg = InboundMessage::classify(json!({"requirements-not-met": "Which level?", "type": "progress"}));
        assert!(matches!(msg, InboundMessage::RequirementsNotMet { .. }));

        let msg = InboundMessage::classify(json!({"type": "progress", "message": "Thinking"}));
        assert_eq!(
            msg,
            InboundMessage::Progress {
                stage: "Thinking".to_string(),
                percent: None
            }
        );

        let msg = InboundMessage::classify(json!({"type": "edit", "edit": {"slideIndex": 3, "slide": {"word": "x"}}}));
        assert!(matches!(msg, InboundMessage::Edit { slide_index: Some(3), .. }));

        let msg = InboundMessage::classify(json!({"title": "Deck", "slides": []}));
        assert!(matches!(msg, InboundMessage::Preview { .. }));

        let msg = InboundMessage::classify(json!({"error": "boom", "message": "ignored"}));
        assert_eq!(msg, InboundMessage::Error { message: "boom".to_string() });

        let msg = InboundMessage::classify(json!({"message": "hello"}));
        assert_eq!(msg, InboundMessage::Info { message: "hello".to_string() });

        let msg = InboundMessage::classify(json!({"foo": 1}));
        assert!(matches!(msg, InboundMessage::Unknown(_)));
    }

    #[test]
    fn test_host_shapes() {
        let msg = InboundMessage::classify(json!({"type": "insertProgress", "current": 2, "total": 5}));
        assert_eq!(msg, InboundMessage::InsertProgress { current: 2, total: 5 });

        let msg = InboundMessage::classify(json!({"type": "success", "message": "3 slides inserted"}));
        assert!(matches!(msg, InboundMessage::Success { .. }));

        let msg = InboundMessage::classify(json!({"type": "progress", "stage": "Drafting", "percent": 40}));
        assert_eq!(
            msg,
            InboundMessage::Progress {
                stage: "Drafting".to_string(),
                percent: Some(40.0)
            }
        );
    }

    #[test]
    fn test_edit_without_payload_is_not_edit() {
        let msg = InboundMessage::classify(json!({"type": "edit", "message": "nothing"}));
        assert_eq!(msg, InboundMessage::Info { message: "nothing".to_string() });
    }

    #[test]
    fn test_preview_key_tracks_titles() {
        let a = InboundMessage::classify(json!({"type": "preview", "slides": [{"title": "A"}, {"title": "B"}]}));
        let b = InboundMessage::classify(json!({"type": "preview", "slides": [{"title": "A"}, {"title": "B"}], "summary": "x"}));
        let c = InboundMessage::classify(json!({"type": "preview", "slides": [{"title": "A"}]}));
        assert_eq!(a.preview_key(), b.preview_key());
        assert_ne!(a.preview_key(), c.preview_key());
        assert!(InboundMessage::classify(json!({"message": "m"})).preview_key().is_none());
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            InboundMessage::parse("{not json"),
            Err(ProtocolError::Deserialization(_))
        ));
    }
}
