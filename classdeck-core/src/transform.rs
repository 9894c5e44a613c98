//! Content transformation layer.
//!
//! Pure functions mapping the server's per-category payload shapes into
//! [`SlideRecord`] lists. Every function is total: missing or mistyped
//! fields become empty strings, and a missing top-level array yields an
//! empty list, which callers treat as "no content produced".
//!
//! ```text
//!   payload ──► detect_shape ──► vocabulary_slides ─┐
//!                            ├─► grammar_slides    ─┤
//!                            ├─► quiz_slides       ─┤
//!                            ├─► homework_slides   ─┼─► Vec<SlideRecord>
//!                            ├─► conversation_slides┤
//!                            ├─► legacy_slides     ─┤
//!                            └─► (records as-is)   ─┘
//! ```
//!
//! Edit replies go through [`transform_edited`], which reuses the same
//! single-item functions so an edited slide has exactly the shape of a
//! freshly generated one.

use serde_json::Value;

use crate::category::ContentCategory;
use crate::slide::{SlideKind, SlideRecord};

/// Which transform applies to a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    Vocabulary,
    Grammar,
    Quiz,
    Homework,
    /// `{title, subtitle, slides: [{"slide-title", content}]}`
    Conversation,
    /// Bare `data` array of loosely-typed slide objects.
    Legacy,
    /// Host `preview` message: `slides` already holds slide records.
    Records,
}

impl From<ContentCategory> for PayloadShape {
    fn from(category: ContentCategory) -> Self {
        match category {
            ContentCategory::Vocabulary => Self::Vocabulary,
            ContentCategory::Grammar => Self::Grammar,
            ContentCategory::Quiz => Self::Quiz,
            ContentCategory::Homework => Self::Homework,
        }
    }
}

/// Pick the transform for `payload`.
///
/// A host `preview` carries finished records. Otherwise an explicit
/// category in the payload's `type` wins, and failing that the shape is
/// recognized by which array is present. A bare `slides` array is read
/// as grammar only when its items are shaped like grammar rules.
pub fn detect_shape(payload: &Value) -> Option<PayloadShape> {
    let kind = payload.get("type").and_then(Value::as_str);
    if kind == Some("preview") {
        return payload.get("slides").map(|_| PayloadShape::Records);
    }
    if let Some(category) = kind.and_then(|t| t.parse::<ContentCategory>().ok()) {
        return Some(category.into());
    }
    if payload.get("words").is_some() {
        Some(PayloadShape::Vocabulary)
    } else if payload.get("questions").is_some() {
        Some(PayloadShape::Quiz)
    } else if payload.get("tasks").is_some() {
        Some(PayloadShape::Homework)
    } else if let Some(slides) = payload.get("slides") {
        let grammar = slides
            .as_array()
            .is_some_and(|items| items.iter().any(is_grammar_rule));
        if grammar {
            Some(PayloadShape::Grammar)
        } else {
            Some(PayloadShape::Conversation)
        }
    } else if payload.get("data").is_some() {
        Some(PayloadShape::Legacy)
    } else {
        None
    }
}

/// Transform a full preview payload into slide records.
pub fn transform_payload(payload: &Value) -> Vec<SlideRecord> {
    match detect_shape(payload) {
        Some(PayloadShape::Vocabulary) => vocabulary_slides(payload),
        Some(PayloadShape::Grammar) => grammar_slides(payload),
        Some(PayloadShape::Quiz) => quiz_slides(payload),
        Some(PayloadShape::Homework) => homework_slides(payload),
        Some(PayloadShape::Conversation) => conversation_slides(payload),
        Some(PayloadShape::Legacy) => legacy_slides(payload.get("data").unwrap_or(&Value::Null)),
        Some(PayloadShape::Records) => legacy_slides(payload.get("slides").unwrap_or(&Value::Null)),
        None => {
            log::debug!("payload has no recognizable slide array");
            Vec::new()
        }
    }
}

/// Transform the single slide carried by an edit reply.
///
/// `existing` is the pre-edit record; quiz and homework slides keep its
/// title when the server does not echo one back.
pub fn transform_edited(
    item: &Value,
    category: Option<ContentCategory>,
    existing: Option<&SlideRecord>,
) -> SlideRecord {
    let kept_title = |fallback: &str| {
        existing
            .map(|r| r.title.clone())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    };
    match category {
        Some(ContentCategory::Vocabulary) => vocabulary_slide(item),
        Some(ContentCategory::Grammar) => grammar_slide(item),
        Some(ContentCategory::Quiz) => quiz_slide(item, &kept_title("Question")),
        Some(ContentCategory::Homework) => homework_slide(item, &kept_title("Task")),
        None => generic_slide(item),
    }
}

// ---------------------------------------------------------------
// Multi-slide transforms
// ---------------------------------------------------------------

pub fn vocabulary_slides(payload: &Value) -> Vec<SlideRecord> {
    let Some(words) = array(payload, "words") else {
        return Vec::new();
    };
    let mut slides = Vec::with_capacity(words.len() + 1);
    slides.push(
        SlideRecord::new(SlideKind::Title, text_or(payload, &["title"], "Vocabulary"))
            .with_subtitle(text(payload, &["subtitle"])),
    );
    slides.extend(words.iter().map(vocabulary_slide));
    slides
}

pub fn grammar_slides(payload: &Value) -> Vec<SlideRecord> {
    let Some(rules) = array(payload, "slides") else {
        return Vec::new();
    };
    let mut slides = Vec::with_capacity(rules.len() + 1);
    slides.push(
        SlideRecord::new(SlideKind::Title, text_or(payload, &["title"], "Grammar"))
            .with_subtitle(text(payload, &["subtitle"])),
    );
    slides.extend(rules.iter().map(grammar_slide));
    slides
}

pub fn quiz_slides(payload: &Value) -> Vec<SlideRecord> {
    let Some(questions) = array(payload, "questions") else {
        return Vec::new();
    };
    let meta = format!(
        "Type: {} | Focus: {}",
        text_or(payload, &["quiz-type"], "Multiple Choice"),
        text_or(payload, &["focus"], "General"),
    );
    let mut slides = vec![SlideRecord::new(SlideKind::Title, text_or(payload, &["title"], "Quiz"))
        .with_subtitle(text(payload, &["subtitle"]))
        .with_body(meta)];

    let mut numbered = 0usize;
    for question in questions {
        if let Some(group) = grouped_questions(question) {
            let from = numbered + 1;
            numbered += group.len();
            slides.push(quiz_slide(question, &format!("Questions {from}–{numbered}")));
        } else if !text(question, &["question"]).is_empty() {
            numbered += 1;
            slides.push(quiz_slide(question, &format!("Question {numbered}")));
        }
    }
    slides
}

pub fn homework_slides(payload: &Value) -> Vec<SlideRecord> {
    let Some(tasks) = array(payload, "tasks") else {
        return Vec::new();
    };
    let meta = format!(
        "Type: {} | Focus: {}",
        text_or(payload, &["homework-type"], "Exercise"),
        text_or(payload, &["focus"], "General"),
    );
    let title = text_or(payload, &["title"], "Homework");
    let mut slides = vec![SlideRecord::new(SlideKind::Title, title)
        .with_subtitle(text(payload, &["subtitle"]))
        .with_body(meta)];
    slides.extend(
        tasks
            .iter()
            .enumerate()
            .map(|(i, task)| homework_slide(task, &format!("Task {}", i + 1))),
    );
    slides
}

/// Unified conversation response. The title slide exists only when the
/// payload carries a title.
pub fn conversation_slides(payload: &Value) -> Vec<SlideRecord> {
    let Some(items) = array(payload, "slides") else {
        return Vec::new();
    };
    let mut slides = Vec::with_capacity(items.len() + 1);
    let title = text(payload, &["title"]);
    if !title.is_empty() {
        slides.push(
            SlideRecord::new(SlideKind::Title, title).with_subtitle(text(payload, &["subtitle"])),
        );
    }
    slides.extend(items.iter().map(generic_slide));
    slides
}

/// Field-for-field mapping of an arbitrary slide array.
pub fn legacy_slides(items: &Value) -> Vec<SlideRecord> {
    match items.as_array() {
        Some(items) => items.iter().map(generic_slide).collect(),
        None => Vec::new(),
    }
}

// ---------------------------------------------------------------
// Single-item transforms
// ---------------------------------------------------------------

pub fn vocabulary_slide(word: &Value) -> SlideRecord {
    SlideRecord::new(SlideKind::Vocabulary, text(word, &["word", "title"]))
        .with_subtitle(text(word, &["translation", "subtitle"]))
        .with_body(text(word, &["definition", "content"]))
        .with_example(text(word, &["example"]))
}

/// Explanation paragraph, then a bulleted usage list, then
/// `sentence → translation` example lines.
pub fn grammar_slide(rule: &Value) -> SlideRecord {
    let nested = rule.get("content").filter(|c| c.is_object());
    let explanation = match nested {
        Some(content) => text(content, &["explanation"]),
        None => text(rule, &["content"]),
    };

    let usage: Vec<String> = array(rule, "usage")
        .or_else(|| nested.and_then(|c| array(c, "usage")))
        .map(|items| items.iter().filter_map(value_text).collect())
        .unwrap_or_default();

    let mut body = explanation;
    if !usage.is_empty() {
        if !body.is_empty() {
            body.push_str("\n\n");
        }
        let bullets: Vec<String> = usage.iter().map(|u| format!("• {u}")).collect();
        body.push_str(&bullets.join("\n"));
    }

    let examples = array(rule, "examples")
        .or_else(|| nested.and_then(|c| array(c, "examples")))
        .map(|items| {
            items
                .iter()
                .filter_map(|ex| {
                    let sentence = text(ex, &["sentence"]);
                    if sentence.is_empty() {
                        return None;
                    }
                    let translation = text(ex, &["translation"]);
                    Some(if translation.is_empty() {
                        sentence
                    } else {
                        format!("{sentence} → {translation}")
                    })
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    SlideRecord::new(
        SlideKind::Grammar,
        text_or(rule, &["slide-title", "slideTitle", "title"], "Grammar Rule"),
    )
    .with_body(body.trim())
    .with_example(examples.trim())
}

/// One question, or a group of questions sharing a slide.
pub fn quiz_slide(item: &Value, default_title: &str) -> SlideRecord {
    let mut body = String::new();
    if let Some(group) = grouped_questions(item) {
        for (i, question) in group.iter().enumerate() {
            body.push_str(&format!("{}. {}\n", i + 1, text(question, &["question"])));
            for (j, option) in options(question).iter().enumerate() {
                body.push_str(&format!("   {}. {option}\n", option_label(j)));
            }
            body.push('\n');
        }
    } else {
        body.push_str(&text(item, &["question"]));
        body.push_str("\n\n");
        for (j, option) in options(item).iter().enumerate() {
            body.push_str(&format!("{}. {option}\n", option_label(j)));
        }
    }
    SlideRecord::new(SlideKind::Quiz, text_or(item, &["title"], default_title))
        .with_body(body.trim())
}

/// Instruction line followed by a 1-indexed item list.
pub fn homework_slide(task: &Value, default_title: &str) -> SlideRecord {
    let instruction = text(task, &["instruction"]);
    let mut body = String::new();
    if !instruction.is_empty() {
        body.push_str(&instruction);
        body.push_str("\n\n");
    }
    if let Some(items) = array(task, "items") {
        for (i, item) in items.iter().filter_map(value_text).enumerate() {
            body.push_str(&format!("{}. {item}\n", i + 1));
        }
    }
    SlideRecord::new(SlideKind::Homework, text_or(task, &["title"], default_title))
        .with_subtitle(instruction)
        .with_body(body.trim())
}

/// Loosely-typed slide object with fallback field names.
pub fn generic_slide(item: &Value) -> SlideRecord {
    let kind = item
        .get("type")
        .and_then(Value::as_str)
        .map(SlideKind::parse_lenient)
        .unwrap_or_default();
    SlideRecord::new(kind, text(item, &["slide-title", "title"]))
        .with_subtitle(text(item, &["subtitle"]))
        .with_body(text(item, &["content", "body"]))
        .with_example(text(item, &["example", "example-sentence"]))
}

// ---------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------

/// Nested `content` object, or a `usage`/`examples` list.
fn is_grammar_rule(item: &Value) -> bool {
    item.get("content").is_some_and(Value::is_object)
        || array(item, "usage").is_some()
        || array(item, "examples").is_some()
}

fn array<'a>(value: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    value.get(key).and_then(Value::as_array)
}

fn grouped_questions(item: &Value) -> Option<&Vec<Value>> {
    array(item, "slide-questions").or_else(|| array(item, "slideQuestions"))
}

fn options(question: &Value) -> Vec<String> {
    array(question, "options")
        .map(|opts| opts.iter().filter_map(value_text).collect())
        .unwrap_or_default()
}

fn option_label(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => char::from(b'A' + i).to_string(),
        _ => (index + 1).to_string(),
    }
}

/// Scalar rendered as text. Empty strings, nulls, arrays and objects are `None`.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// First non-empty scalar among `keys`, or an empty string.
fn text(value: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| value.get(*key).and_then(value_text))
        .unwrap_or_default()
}

fn text_or(value: &Value, keys: &[&str], fallback: &str) -> String {
    let found = text(value, keys);
    if found.is_empty() {
        fallback.to_string()
    } else {
        found
    }
}
