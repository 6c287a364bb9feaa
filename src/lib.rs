//! UniLib - University Library Management System
//!
//! A REST JSON API server for a university library: catalog management,
//! borrowing workflows, reservation queues, overdue fines, and
//! account-request approval.

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
