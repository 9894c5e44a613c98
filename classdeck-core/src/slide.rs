//! Slide records and the review list they live in.
//!
//! A [`SlideRecord`] is the uniform shape every server payload is
//! normalized into. The [`SlideList`] keeps display order and the
//! [`ReviewCursor`] tracks which slide is being reviewed or edited.

use serde::{Deserialize, Serialize};

/// Kind of a slide record. Drives layout at insertion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SlideKind {
    Title,
    Vocabulary,
    Grammar,
    Quiz,
    Homework,
    #[default]
    Content,
}

impl SlideKind {
    /// Parse a loosely-typed `type` field. Anything unrecognized is `Content`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "title" => Self::Title,
            "vocabulary" => Self::Vocabulary,
            "grammar" => Self::Grammar,
            "quiz" => Self::Quiz,
            "homework" => Self::Homework,
            _ => Self::Content,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Vocabulary => "Vocabulary",
            Self::Grammar => "Grammar",
            Self::Quiz => "Quiz",
            Self::Homework => "Homework",
            Self::Content => "Content",
        }
    }
}

/// One reviewable slide.
///
/// Serialized with the wire field names (`type`, `content`) because the
/// record is echoed back to the server as the anchor of an edit request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SlideRecord {
    #[serde(rename = "type", default)]
    pub kind: SlideKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(rename = "content", default)]
    pub body: String,
    #[serde(default)]
    pub example: String,
}

impl SlideRecord {
    pub fn new(kind: SlideKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = example.into();
        self
    }

    /// Whether this is a deck header slide.
    pub fn is_title(&self) -> bool {
        self.kind == SlideKind::Title
    }
}

/// Ordered slide records. Indices are always contiguous `0..len`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlideList {
    records: Vec<SlideRecord>,
}

impl SlideList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SlideRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SlideRecord> {
        self.records.iter()
    }

    /// Remove the record at `index`; later records shift down by one.
    pub fn remove(&mut self, index: usize) -> Option<SlideRecord> {
        if index < self.records.len() {
            Some(self.records.remove(index))
        } else {
            None
        }
    }

    /// Replace the record at `index` in place, returning the previous one.
    pub fn replace(&mut self, index: usize, record: SlideRecord) -> Option<SlideRecord> {
        self.records
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, record))
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Copy of the current records in display order.
    pub fn snapshot(&self) -> Vec<SlideRecord> {
        self.records.clone()
    }

    pub fn titles(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.title.as_str()).collect()
    }
}

impl From<Vec<SlideRecord>> for SlideList {
    fn from(records: Vec<SlideRecord>) -> Self {
        Self { records }
    }
}

/// Review position plus the pending edit target.
///
/// While editing, the edit target follows the cursor: every movement
/// re-targets the edit to the newly reviewed slide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewCursor {
    index: usize,
    edit_target: Option<usize>,
}

impl ReviewCursor {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn edit_target(&self) -> Option<usize> {
        self.edit_target
    }

    pub fn is_editing(&self) -> bool {
        self.edit_target.is_some()
    }

    /// Back to the first slide, not editing.
    pub fn reset(&mut self) {
        self.index = 0;
        self.edit_target = None;
    }

    /// Jump to `index` (used when an edit reply lands).
    pub fn seek(&mut self, index: usize) {
        self.index = index;
        self.follow();
    }

    /// Move forward. Returns `false` when already on the last slide.
    pub fn advance(&mut self, len: usize) -> bool {
        if self.index + 1 < len {
            self.index += 1;
            self.follow();
            true
        } else {
            false
        }
    }

    /// Move back, flooring at zero. Returns `false` on the first slide.
    pub fn retreat(&mut self) -> bool {
        if self.index > 0 {
            self.index -= 1;
            self.follow();
            true
        } else {
            false
        }
    }

    /// Pull the cursor back into `0..len` after a removal.
    pub fn clamp(&mut self, len: usize) {
        if len == 0 {
            self.index = 0;
        } else if self.index >= len {
            self.index = len - 1;
        }
        self.follow();
    }

    pub fn begin_edit(&mut self) {
        self.edit_target = Some(self.index);
    }

    pub fn end_edit(&mut self) {
        self.edit_target = None;
    }

    fn follow(&mut self) {
        if self.edit_target.is_some() {
            self.edit_target = Some(self.index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(n: usize) -> SlideList {
        (0..n)
            .map(|i| SlideRecord::new(SlideKind::Content, format!("Slide {i}")))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn test_kind_parse_lenient() {
        assert_eq!(SlideKind::parse_lenient("Vocabulary"), SlideKind::Vocabulary);
        assert_eq!(SlideKind::parse_lenient(" quiz "), SlideKind::Quiz);
        assert_eq!(SlideKind::parse_lenient("poster"), SlideKind::Content);
    }

    #[test]
    fn test_record_serializes_with_wire_names() {
        let record = SlideRecord::new(SlideKind::Vocabulary, "der Apfel")
            .with_subtitle("the apple")
            .with_body("A fruit.")
            .with_example("Ich esse einen Apfel.");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "Vocabulary");
        assert_eq!(json["content"], "A fruit.");
        assert!(json.get("body").is_none());
    }

    #[test]
    fn test_remove_reindexes() {
        let mut slides = list(3);
        let removed = slides.remove(1).unwrap();
        assert_eq!(removed.title, "Slide 1");
        assert_eq!(slides.titles(), vec!["Slide 0", "Slide 2"]);
        assert!(slides.remove(5).is_none());
    }

    #[test]
    fn test_replace_in_place() {
        let mut slides = list(3);
        let old = slides
            .replace(2, SlideRecord::new(SlideKind::Quiz, "Question 3"))
            .unwrap();
        assert_eq!(old.title, "Slide 2");
        assert_eq!(slides.get(2).unwrap().kind, SlideKind::Quiz);
        assert_eq!(slides.len(), 3);
        assert!(slides.replace(3, SlideRecord::default()).is_none());
    }

    #[test]
    fn test_cursor_bounds() {
        let mut cursor = ReviewCursor::default();
        assert!(!cursor.retreat());
        assert!(cursor.advance(2));
        assert!(!cursor.advance(2));
        assert_eq!(cursor.index(), 1);
        cursor.clamp(1);
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn test_edit_target_follows_cursor() {
        let mut cursor = ReviewCursor::default();
        cursor.advance(4);
        cursor.begin_edit();
        assert_eq!(cursor.edit_target(), Some(1));
        cursor.advance(4);
        assert_eq!(cursor.edit_target(), Some(2));
        cursor.retreat();
        assert_eq!(cursor.edit_target(), Some(1));
        cursor.end_edit();
        cursor.advance(4);
        assert_eq!(cursor.edit_target(), None);
    }
}
