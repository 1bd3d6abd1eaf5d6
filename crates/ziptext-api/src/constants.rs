//! API constants

/// Versioned API prefix, e.g. `/api/v0`.
pub const API_PREFIX: &str = "/api/v0";

/// Multipart field carrying the uploaded archive.
pub const UPLOAD_FIELD: &str = "zip_file";

/// Slack above the configured archive limit for multipart framing.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;
