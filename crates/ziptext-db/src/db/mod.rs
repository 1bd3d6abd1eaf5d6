//! Database repositories for the data access layer
//!
//! `upload` holds the repository trait and its PostgreSQL implementation;
//! `memory` holds an in-process implementation used by tests.

pub mod memory;
pub mod upload;

pub use memory::InMemoryUploadRepository;
pub use upload::{PgUploadRepository, UploadRepository};
