//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared,
//! clonable resources like the store, the tutor and the session keys.

use crate::{auth::sessions::SessionKeys, config::Config, db::Store};
use std::sync::Arc;
use tutor_core::TutoringTurnOrchestrator;

/// The shared application state, created once at startup and passed to all handlers.
/// All fields are public to be accessible from other modules.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tutor: Arc<TutoringTurnOrchestrator>,
    pub sessions: Arc<SessionKeys>,
    pub config: Arc<Config>,
}
