//! Shared key generation for stored files.

use uuid::Uuid;

const ARCHIVE_PREFIX: &str = "zips";
const TEXT_PREFIX: &str = "text_files";

/// Key of the original archive uploaded for a record.
pub fn archive_key(record_id: Uuid, original_filename: &str) -> String {
    format!(
        "{}/{}/{}",
        ARCHIVE_PREFIX,
        record_id,
        base_name(original_filename, "archive.zip")
    )
}

/// Key of the rendered text file for a record, named `{name}.txt`.
pub fn text_key(record_id: Uuid, name: &str) -> String {
    let file_name = format!("{}.txt", base_name(name, "project"));
    format!("{}/{}/{}", TEXT_PREFIX, record_id, file_name)
}

/// Last path segment of a client-supplied name, with either separator.
/// Names that reduce to nothing or still contain `..` use `fallback`.
fn base_name<'a>(name: &'a str, fallback: &'a str) -> &'a str {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if base.is_empty() || base == "." || base.contains("..") {
        fallback
    } else {
        base
    }
}
