//! Tutoring core: lesson types, the tutor preamble, progress directives and
//! the orchestrator that runs a single tutoring turn against a generation
//! capability.

pub mod directive;
pub mod lesson;
pub mod llm_client;
pub mod progress;
pub mod prompt;
pub mod tutor;

pub use directive::{ProgressDirective, ProgressStatus};
pub use lesson::{ConversationTurn, LessonContext, Speaker};
pub use llm_client::{GenerationClient, GenerationError, TutorConfig};
pub use progress::TopicPhase;
pub use tutor::{ReplySource, TurnCancelled, TutorReply, TutoringTurnOrchestrator};
