//! Progress Directive Parsing
//!
//! The tutor is instructed to close a reply with a single flat JSON object
//! when the learner has earned progress, e.g.
//!
//! ```text
//! Great work, that is exactly right!
//! {"action": "update_progress", "subtopic_id": "topic-3", "status": "COMPLETADO"}
//! ```
//!
//! This module finds that object, validates it, and separates it from the
//! learner-visible text. Anything that does not validate stays in the text.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::LazyLock;
use tracing::debug;

/// The only action value the tutor is allowed to emit.
pub const UPDATE_PROGRESS_ACTION: &str = "update_progress";

/// A flat `{ ... }` span mentioning the `"action"` key.
static DIRECTIVE_CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{[^{}]*"action"[^{}]*\}"#).expect("directive pattern is valid")
});

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DirectiveAction {
    #[serde(rename = "update_progress")]
    UpdateProgress,
}

/// Progress states a directive can report.
///
/// The canonical wire values are the ones the tutor prompt asks for; the
/// English spellings are accepted as well.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ProgressStatus {
    #[serde(rename = "COMPLETADO", alias = "COMPLETED")]
    Completed,
    #[serde(rename = "EN_PROGRESO", alias = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "PENDIENTE", alias = "PENDING")]
    Pending,
}

impl ProgressStatus {
    /// Returns the canonical wire literal.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::Completed => "COMPLETADO",
            ProgressStatus::InProgress => "EN_PROGRESO",
            ProgressStatus::Pending => "PENDIENTE",
        }
    }

    /// Parses a canonical or English literal.
    pub fn parse(value: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(value.to_string())).ok()
    }
}

/// Structured instruction from the tutor to record progress on a subtopic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressDirective {
    pub action: DirectiveAction,
    pub subtopic_id: String,
    pub status: ProgressStatus,
}

impl ProgressDirective {
    pub fn completed(subtopic_id: impl Into<String>) -> Self {
        Self {
            action: DirectiveAction::UpdateProgress,
            subtopic_id: subtopic_id.into(),
            status: ProgressStatus::Completed,
        }
    }
}

/// What the last directive-shaped span of a reply turned out to be.
#[derive(Debug)]
enum Candidate {
    Absent,
    ForeignAction(String),
    Malformed(serde_json::Error),
    Directive(Range<usize>, ProgressDirective),
}

fn inspect_last_candidate(raw: &str) -> Candidate {
    let Some(found) = DIRECTIVE_CANDIDATE.find_iter(raw).last() else {
        return Candidate::Absent;
    };

    let value: serde_json::Value = match serde_json::from_str(found.as_str()) {
        Ok(value) => value,
        Err(e) => return Candidate::Malformed(e),
    };

    let action = value.get("action").and_then(|a| a.as_str()).unwrap_or_default();
    if action != UPDATE_PROGRESS_ACTION {
        return Candidate::ForeignAction(action.to_string());
    }

    match serde_json::from_value::<ProgressDirective>(value) {
        Ok(directive) => Candidate::Directive(found.range(), directive),
        Err(e) => Candidate::Malformed(e),
    }
}

/// Splits a raw tutor reply into learner-visible text and an optional directive.
///
/// Only the last directive-shaped span is considered. When it validates, it is
/// cut out and the remaining text is trimmed. In every other case the raw text
/// is returned exactly as received.
pub fn split_directive(raw: &str) -> (String, Option<ProgressDirective>) {
    match inspect_last_candidate(raw) {
        Candidate::Directive(span, directive) => {
            let mut text = String::with_capacity(raw.len() - span.len());
            text.push_str(&raw[..span.start]);
            text.push_str(&raw[span.end..]);
            (text.trim().to_string(), Some(directive))
        }
        Candidate::ForeignAction(action) => {
            debug!(%action, "Ignoring directive with unrecognized action");
            (raw.to_string(), None)
        }
        Candidate::Malformed(e) => {
            debug!(error = %e, "Ignoring malformed directive");
            (raw.to_string(), None)
        }
        Candidate::Absent => (raw.to_string(), None),
    }
}
