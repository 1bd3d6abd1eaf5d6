//! Archive flattening
//!
//! Turns a ZIP archive into a single annotated text document: a tree of the
//! important files followed by the bodies of every decodable text file.
//!
//! ```ignore
//! use ziptext_flatten::{flatten, FlattenRules};
//!
//! let text = flatten(&archive_bytes, &FlattenRules::default())?;
//! ```

pub mod flatten;
pub mod rules;
pub mod tree;

pub use flatten::{
    flatten, flatten_report, ContentEntry, ContentOutcome, FlattenError, FlattenReport,
    FlattenSummary,
};
pub use rules::{FileCategory, FlattenRules};
pub use tree::TreeNode;
