//! Topic Phase Tracking
//!
//! The class protocol (explain, pose a task, evaluate the answer) is only
//! advice to the model. `TopicPhase` tracks the same protocol on our side so
//! callers can refuse to record progress the model claims before a task was
//! ever posed.

use crate::{
    directive::{ProgressDirective, ProgressStatus},
    lesson::{ConversationTurn, Speaker},
    tutor::TutorReply,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TopicPhase {
    /// The tutor has not spoken yet, so no task is pending.
    Explaining,
    /// The tutor has explained and posed a task that awaits an answer.
    AwaitingAnswer,
    /// The learner passed the task. Terminal.
    Completed,
}

impl TopicPhase {
    /// Derives the phase of a topic from its conversation so far.
    pub fn from_history(history: &[ConversationTurn]) -> Self {
        if history.iter().any(|turn| turn.speaker == Speaker::Tutor) {
            TopicPhase::AwaitingAnswer
        } else {
            TopicPhase::Explaining
        }
    }

    /// Whether a directive may be honored in this phase.
    pub fn accepts(&self, directive: &ProgressDirective) -> bool {
        match self {
            TopicPhase::AwaitingAnswer => true,
            TopicPhase::Completed => directive.status == ProgressStatus::Completed,
            TopicPhase::Explaining => false,
        }
    }

    /// The phase after the tutor produced `reply`.
    pub fn after_reply(self, reply: &TutorReply) -> Self {
        match (self, &reply.directive) {
            (TopicPhase::Completed, _) => TopicPhase::Completed,
            (TopicPhase::AwaitingAnswer, Some(directive))
                if directive.status == ProgressStatus::Completed =>
            {
                TopicPhase::Completed
            }
            _ => TopicPhase::AwaitingAnswer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tutor::ReplySource;

    fn reply(directive: Option<ProgressDirective>) -> TutorReply {
        TutorReply {
            explanation: "text".into(),
            directive,
            source: ReplySource::Model,
        }
    }

    #[test]
    fn test_phase_from_history() {
        assert_eq!(TopicPhase::from_history(&[]), TopicPhase::Explaining);
        assert_eq!(
            TopicPhase::from_history(&[ConversationTurn::learner("hi")]),
            TopicPhase::Explaining
        );
        assert_eq!(
            TopicPhase::from_history(&[
                ConversationTurn::learner("hi"),
                ConversationTurn::tutor("explanation + task")
            ]),
            TopicPhase::AwaitingAnswer
        );
    }

    #[test]
    fn test_directive_before_any_task_is_rejected() {
        let directive = ProgressDirective::completed("t1");
        assert!(!TopicPhase::Explaining.accepts(&directive));
        assert_eq!(
            TopicPhase::Explaining.after_reply(&reply(Some(directive))),
            TopicPhase::AwaitingAnswer
        );
    }

    #[test]
    fn test_completion_while_awaiting_answer() {
        let directive = ProgressDirective::completed("t1");
        assert!(TopicPhase::AwaitingAnswer.accepts(&directive));
        assert_eq!(
            TopicPhase::AwaitingAnswer.after_reply(&reply(Some(directive))),
            TopicPhase::Completed
        );
        assert_eq!(
            TopicPhase::AwaitingAnswer.after_reply(&reply(None)),
            TopicPhase::AwaitingAnswer
        );
    }

    #[test]
    fn test_non_completing_status_does_not_complete() {
        let directive = ProgressDirective {
            status: ProgressStatus::InProgress,
            ..ProgressDirective::completed("t1")
        };
        assert!(TopicPhase::AwaitingAnswer.accepts(&directive));
        assert!(!TopicPhase::Completed.accepts(&directive));
        assert_eq!(
            TopicPhase::AwaitingAnswer.after_reply(&reply(Some(directive))),
            TopicPhase::AwaitingAnswer
        );
    }

    #[test]
    fn test_completed_is_terminal() {
        assert_eq!(
            TopicPhase::Completed.after_reply(&reply(None)),
            TopicPhase::Completed
        );
        assert_eq!(
            serde_json::to_string(&TopicPhase::AwaitingAnswer).unwrap(),
            "\"awaiting_answer\""
        );
    }
}
