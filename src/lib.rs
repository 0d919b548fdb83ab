//! keepsake - a small record-keeping service for messages, memories with
//! photos, and a background setting.
//!
//! Library exports for testing and the `keepsake` binary.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;
