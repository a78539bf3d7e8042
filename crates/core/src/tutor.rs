//! Tutoring Turn Orchestration
//!
//! One call to [`TutoringTurnOrchestrator::conduct`] is one tutoring turn: the
//! lesson and the conversation so far are turned into a generation request,
//! the model is asked for the next tutor message, and the raw answer is split
//! into the text shown to the learner and an optional progress directive.
//!
//! The orchestrator keeps no state between turns. Callers own the history and
//! whatever they do with the directive.

use crate::{
    directive::{ProgressDirective, split_directive},
    lesson::{ConversationTurn, LessonContext, Speaker},
    llm_client::{GeminiClient, GenerationClient, PromptTurn, TutorConfig},
    prompt::{PREAMBLE_ACKNOWLEDGEMENT, PreambleTemplate},
};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Shown when the generation capability failed.
pub const RETRY_LATER_MESSAGE: &str =
    "Tutor IA: Sorry, I am still processing. Please try again with your question.";

fn ready_message(topic_name: &str) -> String {
    format!("Tutor IA: I am here to teach you \"{topic_name}\". Tell me what you would like to learn.")
}

fn completed_message(topic_name: &str) -> String {
    format!("Tutor IA: Well done, you have completed \"{topic_name}\".")
}

/// Which path produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    /// The text came from the model.
    Model,
    /// The model failed or said nothing and a canned message was used.
    Fallback,
}

/// The outcome of one tutoring turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorReply {
    /// Learner-visible text. Never empty.
    pub explanation: String,
    pub directive: Option<ProgressDirective>,
    pub source: ReplySource,
}

impl TutorReply {
    fn fallback(explanation: String) -> Self {
        Self {
            explanation,
            directive: None,
            source: ReplySource::Fallback,
        }
    }
}

/// Returned by [`TutoringTurnOrchestrator::conduct_cancellable`] when the
/// caller gave up on the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Tutoring turn was cancelled")]
pub struct TurnCancelled;

pub struct TutoringTurnOrchestrator {
    client: Arc<dyn GenerationClient>,
    preamble: PreambleTemplate,
}

impl TutoringTurnOrchestrator {
    /// Creates an orchestrator talking to Gemini with the built-in preamble.
    pub fn new(config: &TutorConfig) -> Self {
        Self::with_client(Arc::new(GeminiClient::new(config)))
    }

    /// Creates an orchestrator on top of any generation capability.
    pub fn with_client(client: Arc<dyn GenerationClient>) -> Self {
        Self {
            client,
            preamble: PreambleTemplate::builtin(),
        }
    }

    pub fn with_preamble(mut self, preamble: PreambleTemplate) -> Self {
        self.preamble = preamble;
        self
    }

    /// Builds the ordered generation request for a turn.
    ///
    /// The rendered preamble and a canned acknowledgement form a synthetic
    /// first exchange, followed by the history and the new learner message.
    pub fn build_request(
        &self,
        lesson: &LessonContext,
        history: &[ConversationTurn],
        learner_message: &str,
    ) -> Vec<PromptTurn> {
        let mut turns = Vec::with_capacity(history.len() + 3);
        turns.push(PromptTurn::user(self.preamble.render(lesson)));
        turns.push(PromptTurn::model(PREAMBLE_ACKNOWLEDGEMENT));
        turns.extend(history.iter().map(|turn| match turn.speaker {
            Speaker::Learner => PromptTurn::user(turn.text.clone()),
            Speaker::Tutor => PromptTurn::model(turn.text.clone()),
        }));
        turns.push(PromptTurn::user(learner_message));
        turns
    }

    /// Runs one tutoring turn.
    ///
    /// This never fails: provider errors and empty answers degrade to a canned
    /// explanation without a directive.
    #[instrument(
        name = "tutoring_turn",
        skip_all,
        fields(topic_id = %lesson.topic_id, history_len = history.len())
    )]
    pub async fn conduct(
        &self,
        lesson: &LessonContext,
        history: &[ConversationTurn],
        learner_message: &str,
    ) -> TutorReply {
        let turns = self.build_request(lesson, history, learner_message);

        match self.client.generate(turns).await {
            Ok(raw) => interpret(lesson, &raw),
            Err(e) => {
                warn!(error = %e, "Generation failed. Answering with fallback message.");
                TutorReply::fallback(RETRY_LATER_MESSAGE.to_string())
            }
        }
    }

    /// Like [`conduct`](Self::conduct), but abandons the pending generation
    /// call as soon as `cancel` fires.
    pub async fn conduct_cancellable(
        &self,
        lesson: &LessonContext,
        history: &[ConversationTurn],
        learner_message: &str,
        cancel: &CancellationToken,
    ) -> Result<TutorReply, TurnCancelled> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(topic_id = %lesson.topic_id, "Tutoring turn cancelled by caller.");
                Err(TurnCancelled)
            }
            reply = self.conduct(lesson, history, learner_message) => Ok(reply),
        }
    }
}

fn interpret(lesson: &LessonContext, raw: &str) -> TutorReply {
    if raw.trim().is_empty() {
        warn!("Generation returned no text. Answering with fallback message.");
        return TutorReply::fallback(ready_message(&lesson.topic_name));
    }

    let (explanation, directive) = split_directive(raw);
    if let Some(directive) = &directive {
        info!(
            subtopic_id = %directive.subtopic_id,
            status = directive.status.as_str(),
            "Tutor issued a progress directive."
        );
    }

    let explanation = if explanation.is_empty() {
        completed_message(&lesson.topic_name)
    } else {
        explanation
    };

    TutorReply {
        explanation,
        directive,
        source: ReplySource::Model,
    }
}
