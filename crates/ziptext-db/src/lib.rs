//! ziptext Database Library
//!
//! Persistence of upload records behind the `UploadRepository` trait.

pub mod db;

pub use db::{InMemoryUploadRepository, PgUploadRepository, UploadRepository};
