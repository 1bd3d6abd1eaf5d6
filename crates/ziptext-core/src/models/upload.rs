use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use utoipa::ToSchema;
use uuid::Uuid;

/// One flattening job: the uploaded archive, its rendered text and who owns them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UploadRecord {
    pub id: Uuid,
    pub name: String,
    pub original_filename: String,
    pub archive_key: Option<String>,
    pub text_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub size_label: String,
    pub is_active: bool,
    pub owner_id: Option<Uuid>,
}

impl UploadRecord {
    /// Name of the rendered text file offered for download.
    pub fn text_filename(&self) -> String {
        format!("{}.txt", self.name)
    }

    pub fn has_text(&self) -> bool {
        self.text_key.is_some()
    }

    pub fn has_archive(&self) -> bool {
        self.archive_key.is_some()
    }
}

impl Display for UploadRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.name.is_empty() {
            write!(f, "Project {}", self.id)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Fields supplied when a record is first created, before any file is attached.
#[derive(Debug, Clone)]
pub struct NewUploadRecord {
    pub name: String,
    pub original_filename: String,
    pub size_label: String,
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadRecordResponse {
    pub id: Uuid,
    pub name: String,
    pub original_filename: String,
    pub created_at: DateTime<Utc>,
    pub size_label: String,
    pub has_archive: bool,
    pub has_text: bool,
}

impl From<UploadRecord> for UploadRecordResponse {
    fn from(record: UploadRecord) -> Self {
        UploadRecordResponse {
            id: record.id,
            name: record.to_string(),
            has_archive: record.has_archive(),
            has_text: record.has_text(),
            original_filename: record.original_filename,
            created_at: record.created_at,
            size_label: record.size_label,
        }
    }
}

/// Rendered text of a project together with its record.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProjectTextResponse {
    pub project: UploadRecordResponse,
    pub content: String,
}

/// Display name for an uploaded archive: its base file name without the extension.
pub fn project_name_from_filename(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Human-readable archive size, always expressed in megabytes.
pub fn format_size_label(size_bytes: u64) -> String {
    format!("{:.2} MB", size_bytes as f64 / (1024.0 * 1024.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_record(name: &str) -> UploadRecord {
        UploadRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            original_filename: format!("{}.zip", name),
            archive_key: Some("zips/1/site.zip".to_string()),
            text_key: None,
            created_at: Utc::now(),
            size_label: "0.01 MB".to_string(),
            is_active: true,
            owner_id: Some(Uuid::new_v4()),
        }
    }

    #[test]
    fn test_project_name_strips_extension() {
        assert_eq!(project_name_from_filename("my-site.zip"), "my-site");
        assert_eq!(project_name_from_filename("release.v2.zip"), "release.v2");
        assert_eq!(project_name_from_filename("uploads/nested.ZIP"), "nested");
        assert_eq!(project_name_from_filename("noext"), "noext");
    }

    #[test]
    fn test_size_label_in_megabytes() {
        assert_eq!(format_size_label(0), "0.00 MB");
        assert_eq!(format_size_label(1024 * 1024), "1.00 MB");
        assert_eq!(format_size_label(1536 * 1024), "1.50 MB");
        assert_eq!(format_size_label(10_000), "0.01 MB");
    }

    #[test]
    fn test_display_falls_back_to_id() {
        let record = test_record("");
        assert_eq!(record.to_string(), format!("Project {}", record.id));
        assert_eq!(test_record("site").to_string(), "site");
    }

    #[test]
    fn test_response_from_record() {
        let record = test_record("site");
        let id = record.id;
        let response = UploadRecordResponse::from(record);
        assert_eq!(response.id, id);
        assert_eq!(response.name, "site");
        assert_eq!(response.original_filename, "site.zip");
        assert!(response.has_archive);
        assert!(!response.has_text);
    }

    #[test]
    fn test_text_filename() {
        assert_eq!(test_record("site").text_filename(), "site.txt");
    }
}
