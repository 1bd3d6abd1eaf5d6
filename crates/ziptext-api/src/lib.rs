//! ziptext API Library
//!
//! This crate provides the HTTP API handlers, authentication, the project
//! service and application setup.

mod api_doc;
pub mod constants;
mod handlers;
pub mod setup;
pub mod telemetry;

pub mod auth;
pub mod error;
pub mod services;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use services::projects::{FileRemoval, HardDeleteReport, ProjectService};
pub use state::AppState;
