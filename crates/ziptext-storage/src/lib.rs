//! ziptext Storage Library
//!
//! Storage abstraction for uploaded archives and their rendered text, with a
//! local filesystem backend.
//!
//! # Storage key format
//!
//! - **Archives**: `zips/{record_id}/{original_filename}`
//! - **Rendered text**: `text_files/{record_id}/{name}.txt`
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized in the
//! `keys` module.

pub mod keys;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use keys::{archive_key, text_key};
pub use local::LocalStorage;
pub use traits::{ByteStream, Storage, StorageError, StorageResult};
