//! Tutor API Library Crate
//!
//! This library contains all the logic for the tutoring web service,
//! including configuration, database access, authentication, route
//! protection, API handlers and routing. The `api` binary is a thin wrapper
//! around this library.

pub mod auth;
pub mod config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod router;
pub mod state;
