//! Terminal rendering of workflow output.

use classdeck_core::SlideRecord;
use classdeck_workflow::{Effect, NoticeLevel, Phase, Workflow};

/// Line to print for a user-visible effect, if any.
pub fn render_effect(effect: &Effect) -> Option<String> {
    match effect {
        Effect::Notice { level, text } => {
            let tag = match level {
                NoticeLevel::Info => "·",
                NoticeLevel::Success => "✓",
                NoticeLevel::Error => "✗",
            };
            Some(format!("{tag} {text}"))
        }
        Effect::Status(status) => Some(format!("… {status}")),
        Effect::PromptSettings => Some(
            "Class settings needed: :settings <language> <level> [native] [age]".to_string(),
        ),
        _ => None,
    }
}

/// What the review pane currently shows. Compared between events so the
/// slide is only reprinted when it changed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReviewSnapshot {
    slide: Option<(usize, usize, SlideRecord)>,
    phase: Phase,
}

impl ReviewSnapshot {
    pub fn capture(workflow: &Workflow) -> Self {
        Self {
            slide: workflow
                .current_slide()
                .map(|(index, record)| (index, workflow.slides().len(), record.clone())),
            phase: workflow.phase(),
        }
    }

    pub fn render(&self) -> Option<String> {
        let (index, total, record) = self.slide.as_ref()?;
        let editing = matches!(self.phase, Phase::Editing | Phase::Updating);
        Some(render_slide(*index, *total, record, editing))
    }
}

pub fn render_slide(index: usize, total: usize, record: &SlideRecord, editing: bool) -> String {
    let mut out = format!(
        "┌─ Slide {} of {} [{}]{}\n│ {}",
        index + 1,
        total,
        record.kind.label(),
        if editing { " (editing)" } else { "" },
        record.title
    );
    for (label, text) in [("", &record.subtitle), ("", &record.body), ("e.g. ", &record.example)] {
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            out.push_str(&format!("\n│ {label}{line}"));
        }
    }
    let hint = if index + 1 == total {
        ":next inserts"
    } else {
        ":next"
    };
    out.push_str(&format!("\n└─ {hint} · :back · :remove · :edit · :cancel"));
    out
}
