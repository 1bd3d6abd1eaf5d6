//! Filtering rules for the flattener.
//!
//! Three immutable name sets decide what ends up in the output: directories
//! that are never entered, extensions listed in the tree, and extensions whose
//! bodies are concatenated.

use std::collections::BTreeSet;
use std::path::Path;

/// Directory names excluded from traversal wherever they appear.
pub const DEFAULT_BLOCKED_DIRS: &[&str] = &[
    "__pycache__",
    ".git",
    "node_modules",
    ".idea",
    ".vscode",
    "venv",
    "env",
    ".env",
    "dist",
    "build",
    "target",
    "out",
    "tmp",
    "temp",
    "cache",
    "logs",
    "__MACOSX",
    ".pytest_cache",
    ".coverage",
    "htmlcov",
    ".tox",
    ".mypy_cache",
    ".DS_Store",
    "thumbs.db",
    ".Spotlight-V100",
    ".Trashes",
];

/// Extensions shown in the structure tree.
pub const DEFAULT_IMPORTANT_EXTENSIONS: &[&str] = &[
    ".py", ".js", ".html", ".css", ".php", ".java", ".cpp", ".c", ".h", ".rb", ".go", ".rs",
    ".swift", ".kt", ".scala", ".clj", ".hs", ".json", ".xml", ".yml", ".yaml", ".ini", ".cfg",
    ".conf", ".toml", ".txt", ".md", ".rst", ".tex", ".jsx", ".tsx", ".vue", ".svelte", ".ts",
    ".sh", ".bat", ".ps1", ".cmd",
];

/// Extensions whose contents are decoded and concatenated.
pub const DEFAULT_TEXT_EXTENSIONS: &[&str] = &[
    ".py", ".js", ".html", ".css", ".txt", ".md", ".json", ".xml", ".php", ".rb", ".java", ".c",
    ".cpp", ".h", ".cs", ".sql", ".yml", ".yaml", ".ini", ".cfg", ".conf", ".bat", ".sh", ".ts",
    ".jsx", ".tsx", ".vue", ".svelte",
];

/// Immutable rule set consulted by the flattener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenRules {
    blocked_dirs: BTreeSet<String>,
    important_extensions: BTreeSet<String>,
    text_extensions: BTreeSet<String>,
}

impl FlattenRules {
    /// Build a rule set. Extensions are normalized to a lowercase `.ext` form,
    /// blocked directory names are kept verbatim.
    pub fn new<B, I, T>(blocked_dirs: B, important_extensions: I, text_extensions: T) -> Self
    where
        B: IntoIterator,
        B::Item: Into<String>,
        I: IntoIterator,
        I::Item: AsRef<str>,
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        Self {
            blocked_dirs: blocked_dirs.into_iter().map(Into::into).collect(),
            important_extensions: important_extensions
                .into_iter()
                .map(|e| normalize_extension(e.as_ref()))
                .collect(),
            text_extensions: text_extensions
                .into_iter()
                .map(|e| normalize_extension(e.as_ref()))
                .collect(),
        }
    }

    /// Exact, case-sensitive match on the directory name.
    pub fn is_blocked_dir(&self, name: &str) -> bool {
        self.blocked_dirs.contains(name)
    }

    pub fn is_important(&self, filename: &str) -> bool {
        extension_of(filename).is_some_and(|ext| self.important_extensions.contains(&ext))
    }

    pub fn is_text(&self, filename: &str) -> bool {
        extension_of(filename).is_some_and(|ext| self.text_extensions.contains(&ext))
    }
}

impl Default for FlattenRules {
    fn default() -> Self {
        Self::new(
            DEFAULT_BLOCKED_DIRS.iter().copied(),
            DEFAULT_IMPORTANT_EXTENSIONS,
            DEFAULT_TEXT_EXTENSIONS,
        )
    }
}

fn normalize_extension(ext: &str) -> String {
    let lower = ext.trim().to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{}", lower)
    }
}

/// Lowercase extension of a file name including the leading dot.
///
/// Dot files such as `.bashrc` have no extension.
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{}", e.to_lowercase()))
}

/// Icon category of a file in the structure tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Code,
    Image,
    Archive,
    Document,
    Other,
}

impl FileCategory {
    pub fn of(filename: &str) -> Self {
        match extension_of(filename).as_deref() {
            Some(".py" | ".js" | ".html" | ".css" | ".txt" | ".md" | ".json" | ".xml") => {
                FileCategory::Code
            }
            Some(".jpg" | ".jpeg" | ".png" | ".gif" | ".svg" | ".ico" | ".bmp") => {
                FileCategory::Image
            }
            Some(".zip" | ".rar" | ".tar" | ".gz" | ".7z") => FileCategory::Archive,
            Some(".pdf" | ".doc" | ".docx") => FileCategory::Document,
            _ => FileCategory::Other,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            FileCategory::Code => "📄",
            FileCategory::Image => "🖼️",
            FileCategory::Archive => "📦",
            FileCategory::Document => "📎",
            FileCategory::Other => "📄",
        }
    }
}
