//! Library catalog and lending server
//!
//! Keeps the record of authors, books and borrowers, and runs the lending
//! state machine that moves a book between available and borrowed while
//! appending to its loan history. Exposed as a REST JSON API.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<services::Services>,
}
