//! Application services sitting between the HTTP handlers and the
//! repository, storage and flattening layers.

pub mod projects;

pub use projects::{FileRemoval, HardDeleteReport, ProjectService};
