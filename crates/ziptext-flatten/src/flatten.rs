//! Archive extraction and rendering.
//!
//! The archive is fully extracted into a private temporary directory, walked
//! once with blocked directories pruned, and rendered into two sections:
//! the structure tree of important files and the concatenated bodies of text
//! files. The temporary directory is removed when the call returns, on success
//! and on failure alike.

use std::cmp::Ordering;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use walkdir::{DirEntry, WalkDir};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::rules::FlattenRules;
use crate::tree::TreeNode;

const STRUCTURE_BANNER: &str = "📁 PROJECT STRUCTURE (IMPORTANT FILES ONLY):";
const CONTENTS_BANNER: &str = "FILE CONTENTS:";
const SECTION_RULE_WIDTH: usize = 80;
const BLOCK_RULE_WIDTH: usize = 40;
/// Upper bound on the buffer reserved from a member's declared size.
const PREALLOC_LIMIT: u64 = 16 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum FlattenError {
    /// The input is not a readable ZIP archive.
    #[error("invalid ZIP archive: {0}")]
    Archive(String),

    /// The temporary workspace could not be created or written.
    #[error("workspace I/O error: {0}")]
    Io(#[from] io::Error),
}

// The archive is read from memory, so any failure inside the zip reader
// (headers, decompression, checksums) is a property of the input.
impl From<ZipError> for FlattenError {
    fn from(err: ZipError) -> Self {
        FlattenError::Archive(err.to_string())
    }
}

/// What happened to one text-listed file during the content pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentOutcome {
    /// Decoded and emitted as a content block.
    Included,
    /// Not valid UTF-8; omitted from the output.
    SkippedUndecodable,
    /// Reading failed; emitted as a block carrying the error marker.
    ReadFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEntry {
    /// Path relative to the archive root, `/`-separated.
    pub path: String,
    pub outcome: ContentOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenSummary {
    /// Number of file leaves in the structure tree.
    pub tree_files: usize,
    /// Content pass outcomes in output order.
    pub entries: Vec<ContentEntry>,
}

impl FlattenSummary {
    pub fn included(&self) -> usize {
        self.count(|o| matches!(o, ContentOutcome::Included))
    }

    pub fn skipped_undecodable(&self) -> usize {
        self.count(|o| matches!(o, ContentOutcome::SkippedUndecodable))
    }

    pub fn read_failed(&self) -> usize {
        self.count(|o| matches!(o, ContentOutcome::ReadFailed(_)))
    }

    fn count(&self, pred: impl Fn(&ContentOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }
}

#[derive(Debug, Clone)]
pub struct FlattenReport {
    pub text: String,
    pub summary: FlattenSummary,
}

/// Flatten archive bytes into the annotated text document.
pub fn flatten(archive: &[u8], rules: &FlattenRules) -> Result<String, FlattenError> {
    flatten_report(archive, rules).map(|report| report.text)
}

/// Like [`flatten`], also returning what the content pass did with each file.
pub fn flatten_report(archive: &[u8], rules: &FlattenRules) -> Result<FlattenReport, FlattenError> {
    let mut zip = ZipArchive::new(Cursor::new(archive))
        .map_err(|e| FlattenError::Archive(e.to_string()))?;

    let workspace = tempfile::Builder::new().prefix("ziptext-").tempdir()?;
    extract_into(&mut zip, workspace.path())?;

    tracing::debug!(
        entries = zip.len(),
        workspace = %workspace.path().display(),
        "Archive extracted"
    );

    let report = render_directory(&workspace, rules);
    if let Err(e) = workspace.close() {
        tracing::warn!(error = %e, "Failed to remove extraction workspace");
    }

    tracing::debug!(
        tree_files = report.summary.tree_files,
        included = report.summary.included(),
        skipped_undecodable = report.summary.skipped_undecodable(),
        read_failed = report.summary.read_failed(),
        bytes = report.text.len(),
        "Archive flattened"
    );

    Ok(report)
}

/// Unpack every member below `dest`.
///
/// Reading or decompressing a member fails with `Archive`; creating or
/// writing files under `dest` fails with `Io`. Member names are cleaned with
/// [`sanitized_path`] instead of rejecting the archive.
fn extract_into<R: Read + Seek>(zip: &mut ZipArchive<R>, dest: &Path) -> Result<(), FlattenError> {
    for index in 0..zip.len() {
        let mut member = zip.by_index(index)?;
        let name = member.name().to_string();
        let Some(rel) = sanitized_path(&name) else {
            tracing::debug!(name = %name, "Skipping member without a usable path");
            continue;
        };
        let target = dest.join(rel);

        if member.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        let mut data = Vec::with_capacity(member.size().min(PREALLOC_LIMIT) as usize);
        member
            .read_to_end(&mut data)
            .map_err(|e| FlattenError::Archive(format!("{}: {}", name, e)))?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &data)?;
    }
    Ok(())
}

/// Relative path for a member name with empty, `.` and `..` segments removed,
/// so absolute and parent-relative names land inside the workspace.
fn sanitized_path(name: &str) -> Option<PathBuf> {
    let path: PathBuf = name
        .split(['/', '\\'])
        .filter(|segment| !matches!(*segment, "" | "." | ".."))
        .collect();
    if path.as_os_str().is_empty() {
        None
    } else {
        Some(path)
    }
}

fn render_directory(workspace: &TempDir, rules: &FlattenRules) -> FlattenReport {
    let root = workspace.path();
    let mut tree = TreeNode::default();
    let mut text_files = Vec::new();

    for entry in walk(root, rules) {
        let Some(rel) = relative_segments(root, entry.path()) else {
            continue;
        };
        let Some((name, parents)) = rel.split_last() else {
            continue;
        };
        let parents = parents.iter().map(String::as_str);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            tree.dir_mut(parents.chain(std::iter::once(name.as_str())));
        } else if file_type.is_file() {
            if rules.is_important(name) {
                tree.insert_file(parents, name);
            }
            if rules.is_text(name) {
                text_files.push((rel.join("/"), entry.into_path()));
            }
        }
    }

    let mut text = String::new();
    text.push_str(STRUCTURE_BANNER);
    text.push_str("\n\n");
    text.push_str(&tree.render());
    text.push_str("\n\n");
    text.push_str(&"=".repeat(SECTION_RULE_WIDTH));
    text.push('\n');
    text.push_str(CONTENTS_BANNER);
    text.push('\n');
    text.push_str(&"=".repeat(SECTION_RULE_WIDTH));
    text.push_str("\n\n");

    let mut entries = Vec::with_capacity(text_files.len());
    for (rel, path) in text_files {
        let outcome = read_content(&path, &rel, &mut text);
        entries.push(ContentEntry { path: rel, outcome });
    }

    FlattenReport {
        text,
        summary: FlattenSummary {
            tree_files: tree.file_count(),
            entries,
        },
    }
}

/// Top-down walk below `root` with blocked directories pruned. Within a
/// directory, files come before subdirectories and each group is sorted by name.
fn walk<'a>(root: &Path, rules: &'a FlattenRules) -> impl Iterator<Item = DirEntry> + 'a {
    WalkDir::new(root)
        .min_depth(1)
        .sort_by(|a, b| match (a.file_type().is_dir(), b.file_type().is_dir()) {
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            _ => a.file_name().cmp(b.file_name()),
        })
        .into_iter()
        .filter_entry(move |e| !(e.file_type().is_dir() && is_blocked(e, rules)))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable entry");
                None
            }
        })
}

fn is_blocked(entry: &DirEntry, rules: &FlattenRules) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| rules.is_blocked_dir(name))
}

fn relative_segments(root: &Path, path: &Path) -> Option<Vec<String>> {
    let rel = path.strip_prefix(root).ok()?;
    Some(
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect(),
    )
}

/// Append the content block for one file and report what was written.
fn read_content(path: &Path, rel: &str, out: &mut String) -> ContentOutcome {
    let outcome = match fs::read(path) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(content) => {
                let _ = write!(
                    out,
                    "--- {} ---\n{}\n{}\n\n",
                    rel,
                    content,
                    "-".repeat(BLOCK_RULE_WIDTH)
                );
                ContentOutcome::Included
            }
            Err(_) => {
                tracing::debug!(path = %rel, "Skipping file that is not valid UTF-8");
                ContentOutcome::SkippedUndecodable
            }
        },
        Err(e) => {
            tracing::warn!(path = %rel, error = %e, "Failed to read file");
            ContentOutcome::ReadFailed(e.to_string())
        }
    };

    if let ContentOutcome::ReadFailed(ref reason) = outcome {
        let _ = write!(out, "--- {} ---\n[READ ERROR: {}]\n\n", rel, reason);
    }
    outcome
}
