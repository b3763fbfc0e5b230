//! Libris Library Lending Server
//!
//! Members browse the catalog, borrow and return copies; staff see
//! aggregate lending statistics. Pages are served as JSON view contexts and
//! every mutation answers with a redirect carrying a flash message.

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
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
