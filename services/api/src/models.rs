//! API and Database Models
//!
//! This module defines the core data structures used for both database mapping
//! with `sqlx` and for generating OpenAPI documentation with `utoipa`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use tutor_core::{
    ConversationTurn, ProgressDirective, ReplySource, Speaker, TopicPhase, TutorReply,
};
use utoipa::ToSchema;
use uuid::Uuid;

/// Account role. The wire and database values are the product's own labels.
#[derive(sqlx::Type, Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq, Default)]
#[sqlx(type_name = "user_role")]
pub enum Role {
    #[serde(rename = "profesor")]
    #[sqlx(rename = "profesor")]
    Teacher,
    #[default]
    #[serde(rename = "alumno")]
    #[sqlx(rename = "alumno")]
    Student,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Teacher => write!(f, "profesor"),
            Role::Student => write!(f, "alumno"),
        }
    }
}

/// A registered account. The password hash never leaves the server.
#[derive(FromRow, Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Public view of a [`User`].
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct UserResponse {
    #[schema(value_type = String, format = Uuid)]
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct RegisterPayload {
    #[schema(example = "ana@example.com")]
    pub email: String,
    #[schema(example = "correct horse battery")]
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginPayload {
    #[schema(example = "ana@example.com")]
    pub email: String,
    pub password: String,
}

/// Answer of `GET /auth/me`. `user` is null for anonymous callers.
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct CurrentUserResponse {
    pub user: Option<UserResponse>,
}

/// Progress recorded for one learner and subtopic.
#[derive(Serialize, Deserialize, ToSchema, FromRow, Debug, Clone, PartialEq)]
pub struct ProgressRecord {
    #[schema(value_type = String, format = Uuid)]
    pub user_id: Uuid,
    #[schema(example = "topic-3")]
    pub subtopic_id: String,
    #[schema(example = "COMPLETADO")]
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TurnSpeaker {
    Learner,
    Tutor,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct TurnPayload {
    pub speaker: TurnSpeaker,
    pub text: String,
}

impl From<TurnPayload> for ConversationTurn {
    fn from(turn: TurnPayload) -> Self {
        let speaker = match turn.speaker {
            TurnSpeaker::Learner => Speaker::Learner,
            TurnSpeaker::Tutor => Speaker::Tutor,
        };
        ConversationTurn {
            speaker,
            text: turn.text,
        }
    }
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct ChatPayload {
    #[schema(example = "topic-3")]
    pub topic_id: Option<String>,
    #[schema(example = "Ohm's law")]
    pub topic_name: String,
    #[serde(default)]
    pub topic_content: String,
    /// Prior turns, oldest first.
    #[serde(default)]
    pub history: Vec<TurnPayload>,
    #[schema(example = "V = 12 volts")]
    pub message: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct DirectiveResponse {
    #[schema(example = "update_progress")]
    pub action: String,
    #[schema(example = "topic-3")]
    pub subtopic_id: String,
    #[schema(example = "COMPLETADO")]
    pub status: String,
}

impl From<&ProgressDirective> for DirectiveResponse {
    fn from(directive: &ProgressDirective) -> Self {
        Self {
            action: tutor_core::directive::UPDATE_PROGRESS_ACTION.to_string(),
            subtopic_id: directive.subtopic_id.clone(),
            status: directive.status.as_str().to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ChatResponse {
    pub explanation: String,
    pub directive: Option<DirectiveResponse>,
    /// `model` or `fallback`.
    #[schema(example = "model")]
    pub source: String,
    /// `explaining`, `awaiting_answer` or `completed`.
    #[schema(example = "awaiting_answer")]
    pub phase: String,
}

impl ChatResponse {
    pub fn new(reply: &TutorReply, phase: TopicPhase) -> Self {
        let source = match reply.source {
            ReplySource::Model => "model",
            ReplySource::Fallback => "fallback",
        };
        let phase = match phase {
            TopicPhase::Explaining => "explaining",
            TopicPhase::AwaitingAnswer => "awaiting_answer",
            TopicPhase::Completed => "completed",
        };
        Self {
            explanation: reply.explanation.clone(),
            directive: reply.directive.as_ref().map(DirectiveResponse::from),
            source: source.to_string(),
            phase: phase.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ErrorResponse {
    pub message: String,
}
