use serde::{Deserialize, Serialize};

/// Topic identifier used when the caller does not name one.
pub const DEFAULT_TOPIC_ID: &str = "current";

/// The lesson material a single tutoring turn is about.
///
/// The context is read-only for the duration of a turn; the orchestrator only
/// borrows it to render the instruction preamble.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LessonContext {
    /// Opaque identifier echoed back in progress directives.
    #[serde(default = "default_topic_id")]
    pub topic_id: String,
    pub topic_name: String,
    /// Reference text shown to the model. May be empty.
    #[serde(default)]
    pub topic_content: String,
}

fn default_topic_id() -> String {
    DEFAULT_TOPIC_ID.to_string()
}

impl LessonContext {
    /// Creates a context for the given topic. A missing or blank `topic_id`
    /// falls back to [`DEFAULT_TOPIC_ID`].
    pub fn new(
        topic_id: Option<String>,
        topic_name: impl Into<String>,
        topic_content: impl Into<String>,
    ) -> Self {
        let topic_id = topic_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(default_topic_id);
        Self {
            topic_id,
            topic_name: topic_name.into(),
            topic_content: topic_content.into(),
        }
    }
}

/// Who authored a turn of the conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Learner,
    Tutor,
}

/// One message of the learner-visible conversation history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
}

impl ConversationTurn {
    pub fn learner(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Learner,
            text: text.into(),
        }
    }

    pub fn tutor(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Tutor,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_topic_id_falls_back_to_sentinel() {
        let lesson = LessonContext::new(Some("   ".into()), "Fractions", "");
        assert_eq!(lesson.topic_id, DEFAULT_TOPIC_ID);

        let lesson = LessonContext::new(None, "Fractions", "");
        assert_eq!(lesson.topic_id, DEFAULT_TOPIC_ID);

        let lesson = LessonContext::new(Some("topic-3".into()), "Fractions", "");
        assert_eq!(lesson.topic_id, "topic-3");
    }

    #[test]
    fn test_lesson_deserialization_defaults() {
        let lesson: LessonContext = serde_json::from_str(r#"{"topic_name": "Vectors"}"#).unwrap();
        assert_eq!(lesson.topic_id, "current");
        assert_eq!(lesson.topic_content, "");
    }

    #[test]
    fn test_speaker_wire_format() {
        let turn: ConversationTurn =
            serde_json::from_str(r#"{"speaker": "tutor", "text": "Hi"}"#).unwrap();
        assert_eq!(turn, ConversationTurn::tutor("Hi"));
        assert_eq!(
            serde_json::to_string(&Speaker::Learner).unwrap(),
            "\"learner\""
        );
        assert!(serde_json::from_str::<Speaker>("\"model\"").is_err());
    }
}
