//! Project upload lifecycle.
//!
//! An upload creates the record first, then stores the archive, flattens it on
//! a blocking thread and stores the rendered text. If any step after record
//! creation fails, files already stored are removed best-effort and the record
//! is deleted before the error is returned.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use uuid::Uuid;
use ziptext_core::models::{
    format_size_label, project_name_from_filename, NewUploadRecord, UploadRecord,
};
use ziptext_core::AppError;
use ziptext_db::UploadRepository;
use ziptext_flatten::{flatten_report, FlattenRules};
use ziptext_storage::{archive_key, text_key, ByteStream, Storage, StorageError};

use crate::error::{flatten_error, storage_error};

/// What happened to one stored file during a hard delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileRemoval {
    Removed,
    /// No key was recorded or the file was already gone.
    Missing,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardDeleteReport {
    pub record_id: Uuid,
    pub archive: FileRemoval,
    pub text: FileRemoval,
}

#[derive(Clone)]
pub struct ProjectService {
    repository: Arc<dyn UploadRepository>,
    storage: Arc<dyn Storage>,
    rules: Arc<FlattenRules>,
    max_upload_size: usize,
}

impl ProjectService {
    pub fn new(
        repository: Arc<dyn UploadRepository>,
        storage: Arc<dyn Storage>,
        rules: FlattenRules,
        max_upload_size: usize,
    ) -> Self {
        Self {
            repository,
            storage,
            rules: Arc::new(rules),
            max_upload_size,
        }
    }

    /// Validate, store and flatten an uploaded archive for `owner_id`.
    #[tracing::instrument(skip(self, data), fields(owner_id = %owner_id))]
    pub async fn upload(
        &self,
        owner_id: Uuid,
        original_filename: &str,
        data: impl Into<Bytes>,
    ) -> Result<UploadRecord, AppError> {
        let data: Bytes = data.into();
        self.validate_upload(original_filename, &data)?;

        let record = self
            .repository
            .create(NewUploadRecord {
                name: project_name_from_filename(original_filename),
                original_filename: original_filename.to_string(),
                size_label: format_size_label(data.len() as u64),
                owner_id: Some(owner_id),
            })
            .await?;

        let mut stored_keys = Vec::new();
        match self.process(&record, data, &mut stored_keys).await {
            Ok(record) => {
                tracing::info!(project_id = %record.id, name = %record.name, "Project uploaded");
                Ok(record)
            }
            Err(e) => {
                tracing::warn!(project_id = %record.id, error = %e, "Upload failed, removing record");
                self.discard(record.id, &stored_keys).await;
                Err(e)
            }
        }
    }

    async fn process(
        &self,
        record: &UploadRecord,
        data: Bytes,
        stored_keys: &mut Vec<String>,
    ) -> Result<UploadRecord, AppError> {
        let zip_key = archive_key(record.id, &record.original_filename);
        self.storage
            .upload_with_key(&zip_key, data.clone())
            .await
            .map_err(storage_error)?;
        stored_keys.push(zip_key.clone());
        self.repository.attach_archive(record.id, &zip_key).await?;

        let rules = self.rules.clone();
        let start = Instant::now();
        let report = tokio::task::spawn_blocking(move || flatten_report(&data, &rules))
            .await
            .map_err(|e| AppError::Internal(format!("Flatten task failed: {}", e)))?
            .map_err(flatten_error)?;

        tracing::info!(
            project_id = %record.id,
            tree_files = report.summary.tree_files,
            included = report.summary.included(),
            skipped_undecodable = report.summary.skipped_undecodable(),
            read_failed = report.summary.read_failed(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Archive flattened"
        );

        let txt_key = text_key(record.id, &record.name);
        self.storage
            .upload_with_key(&txt_key, Bytes::from(report.text))
            .await
            .map_err(storage_error)?;
        stored_keys.push(txt_key.clone());

        self.repository.attach_text(record.id, &txt_key).await
    }

    /// Orphan cleanup after a failed upload. Failures are logged, not returned.
    async fn discard(&self, record_id: Uuid, stored_keys: &[String]) {
        for key in stored_keys {
            if let Err(e) = self.storage.delete(key).await {
                tracing::warn!(key = %key, error = %e, "Failed to remove stored file of failed upload");
            }
        }
        if let Err(e) = self.repository.delete(record_id).await {
            tracing::error!(project_id = %record_id, error = %e, "Failed to remove record of failed upload");
        }
    }

    fn validate_upload(&self, original_filename: &str, data: &[u8]) -> Result<(), AppError> {
        if original_filename.trim().is_empty() {
            return Err(AppError::InvalidInput("Please choose a ZIP file".to_string()));
        }
        if !original_filename.to_lowercase().ends_with(".zip") {
            return Err(AppError::InvalidInput(
                "Only .zip archives are accepted".to_string(),
            ));
        }
        if data.is_empty() {
            return Err(AppError::InvalidInput("Uploaded file is empty".to_string()));
        }
        if data.len() > self.max_upload_size {
            return Err(AppError::PayloadTooLarge(format!(
                "Archive exceeds maximum allowed size of {} MB",
                self.max_upload_size / 1024 / 1024
            )));
        }
        Ok(())
    }

    /// Active projects of `owner_id`, newest first.
    pub async fn history(&self, owner_id: Uuid) -> Result<Vec<UploadRecord>, AppError> {
        self.repository.list_active_by_owner(owner_id).await
    }

    /// A project owned by `owner_id`, active or not.
    pub async fn get(&self, id: Uuid, owner_id: Uuid) -> Result<UploadRecord, AppError> {
        self.repository
            .get_for_owner(id, owner_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))
    }

    /// Rendered text of a project as a string.
    pub async fn read_text(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<(UploadRecord, String), AppError> {
        let record = self.get(id, owner_id).await?;
        let key = required_key(record.text_key.as_deref())?;
        let bytes = self.storage.download(key).await.map_err(storage_error)?;
        let content = String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("Stored text is not valid UTF-8: {}", e)))?;
        Ok((record, content))
    }

    pub async fn text_stream(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<(UploadRecord, ByteStream), AppError> {
        let record = self.get(id, owner_id).await?;
        let stream = self.open(record.text_key.as_deref()).await?;
        Ok((record, stream))
    }

    pub async fn archive_stream(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<(UploadRecord, ByteStream), AppError> {
        let record = self.get(id, owner_id).await?;
        let stream = self.open(record.archive_key.as_deref()).await?;
        Ok((record, stream))
    }

    async fn open(&self, key: Option<&str>) -> Result<ByteStream, AppError> {
        let key = required_key(key)?;
        self.storage
            .download_stream(key)
            .await
            .map_err(storage_error)
    }

    /// Hide a project from its owner's history. Stored files are kept.
    pub async fn soft_delete(&self, id: Uuid, owner_id: Uuid) -> Result<(), AppError> {
        if self.repository.soft_delete(id, owner_id).await? {
            tracing::info!(project_id = %id, "Project soft-deleted");
            Ok(())
        } else {
            Err(AppError::NotFound("Project not found".to_string()))
        }
    }

    /// Remove both stored files and then the record, regardless of owner.
    pub async fn hard_delete(&self, id: Uuid) -> Result<HardDeleteReport, AppError> {
        let record = self
            .repository
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

        let archive = self.remove_file(record.archive_key.as_deref()).await;
        let text = self.remove_file(record.text_key.as_deref()).await;
        self.repository.delete(id).await?;

        tracing::info!(
            project_id = %id,
            archive = ?archive,
            text = ?text,
            "Project hard-deleted"
        );

        Ok(HardDeleteReport {
            record_id: id,
            archive,
            text,
        })
    }

    async fn remove_file(&self, key: Option<&str>) -> FileRemoval {
        let Some(key) = key else {
            return FileRemoval::Missing;
        };
        match self.storage.exists(key).await {
            Ok(false) => return FileRemoval::Missing,
            Ok(true) => {}
            Err(e) => return FileRemoval::Failed(e.to_string()),
        }
        match self.storage.delete(key).await {
            Ok(()) => FileRemoval::Removed,
            Err(StorageError::NotFound(_)) => FileRemoval::Missing,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to remove stored file");
                FileRemoval::Failed(e.to_string())
            }
        }
    }
}

fn required_key(key: Option<&str>) -> Result<&str, AppError> {
    key.ok_or_else(|| AppError::NotFound("File not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::TempDir;
    use ziptext_db::InMemoryUploadRepository;
    use ziptext_storage::LocalStorage;

    const MAX_UPLOAD: usize = 1024 * 1024;

    struct Fixture {
        service: ProjectService,
        repository: InMemoryUploadRepository,
        storage: Arc<LocalStorage>,
        _dir: TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(
            LocalStorage::new(dir.path()).await.unwrap(),
        );
        let repository = InMemoryUploadRepository::new();
        let service = ProjectService::new(
            Arc::new(repository.clone()),
            storage.clone(),
            FlattenRules::default(),
            MAX_UPLOAD,
        );
        Fixture {
            service,
            repository,
            storage,
            _dir: dir,
        }
    }

    fn zip_with(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buffer));
            for (name, body) in entries {
                zip.start_file(*name, zip::write::FileOptions::default())
                    .unwrap();
                zip.write_all(body.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buffer
    }

    #[tokio::test]
    async fn test_upload_stores_archive_and_text() {
        let fx = fixture().await;
        let owner = Uuid::new_v4();
        let archive = zip_with(&[("README.md", "hi")]);

        let record = fx
            .service
            .upload(owner, "demo.zip", archive.clone())
            .await
            .unwrap();

        assert_eq!(record.name, "demo");
        assert_eq!(record.original_filename, "demo.zip");
        assert_eq!(record.owner_id, Some(owner));
        assert!(record.size_label.ends_with(" MB"));
        assert_eq!(
            record.archive_key.as_deref(),
            Some(format!("zips/{}/demo.zip", record.id).as_str())
        );
        assert_eq!(
            record.text_key.as_deref(),
            Some(format!("text_files/{}/demo.txt", record.id).as_str())
        );

        let stored = fx
            .storage
            .download(record.archive_key.as_deref().unwrap())
            .await
            .unwrap();
        assert_eq!(stored, archive);

        let (_, text) = fx.service.read_text(record.id, owner).await.unwrap();
        assert!(text.starts_with("📁 PROJECT STRUCTURE (IMPORTANT FILES ONLY):"));
        assert!(text.contains("--- README.md ---\nhi\n"));
    }

    #[tokio::test]
    async fn test_invalid_archive_leaves_no_orphans() {
        let fx = fixture().await;
        let owner = Uuid::new_v4();

        let err = fx
            .service
            .upload(owner, "broken.zip", Bytes::from_static(b"this is not a zip"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidArchive(_)));
        assert!(fx.repository.is_empty());
        assert!(fx.service.history(owner).await.unwrap().is_empty());

        let zips_dir = fx.storage.base_path().join("zips");
        let leftovers = std::fs::read_dir(&zips_dir)
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_corrupt_archive_leaves_no_orphans() {
        let fx = fixture().await;
        let owner = Uuid::new_v4();

        let mut archive = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut archive));
            let options =
                zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
            zip.start_file("main.py", options).unwrap();
            zip.write_all(b"print('hello')").unwrap();
            zip.finish().unwrap();
        }
        // Stored data starts after the 30-byte local header, the name and the extra field.
        let name_len = u16::from_le_bytes([archive[26], archive[27]]) as usize;
        let extra_len = u16::from_le_bytes([archive[28], archive[29]]) as usize;
        archive[30 + name_len + extra_len] ^= 0xff;

        let err = fx
            .service
            .upload(owner, "corrupt.zip", archive)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidArchive(_)));
        assert!(fx.repository.is_empty());

        let zips_dir = fx.storage.base_path().join("zips");
        let leftovers = std::fs::read_dir(&zips_dir)
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_upload_validation() {
        let fx = fixture().await;
        let owner = Uuid::new_v4();

        let err = fx
            .service
            .upload(owner, "notes.txt", Bytes::from_static(b"hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err = fx
            .service
            .upload(owner, "empty.zip", Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err = fx
            .service
            .upload(owner, "huge.zip", vec![0u8; MAX_UPLOAD + 1])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));

        assert!(fx.repository.is_empty());
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_history_but_keeps_files() {
        let fx = fixture().await;
        let owner = Uuid::new_v4();
        let record = fx
            .service
            .upload(owner, "site.zip", zip_with(&[("index.html", "<p>")]))
            .await
            .unwrap();

        fx.service.soft_delete(record.id, owner).await.unwrap();

        assert!(fx.service.history(owner).await.unwrap().is_empty());
        assert!(fx
            .storage
            .exists(record.text_key.as_deref().unwrap())
            .await
            .unwrap());
        let (_, text) = fx.service.read_text(record.id, owner).await.unwrap();
        assert!(text.contains("index.html"));

        let err = fx
            .service
            .soft_delete(record.id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_other_owner_cannot_read() {
        let fx = fixture().await;
        let owner = Uuid::new_v4();
        let record = fx
            .service
            .upload(owner, "site.zip", zip_with(&[("a.py", "x = 1")]))
            .await
            .unwrap();

        let err = fx
            .service
            .read_text(record.id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(fx
            .service
            .archive_stream(record.id, Uuid::new_v4())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_hard_delete_reports_each_file() {
        let fx = fixture().await;
        let owner = Uuid::new_v4();
        let record = fx
            .service
            .upload(owner, "site.zip", zip_with(&[("a.py", "x = 1")]))
            .await
            .unwrap();

        // Text file removed behind the service's back
        fx.storage
            .delete(record.text_key.as_deref().unwrap())
            .await
            .unwrap();

        let report = fx.service.hard_delete(record.id).await.unwrap();

        assert_eq!(report.record_id, record.id);
        assert_eq!(report.archive, FileRemoval::Removed);
        assert_eq!(report.text, FileRemoval::Missing);
        assert!(fx.repository.is_empty());
        assert!(!fx
            .storage
            .exists(record.archive_key.as_deref().unwrap())
            .await
            .unwrap());

        let err = fx.service.hard_delete(record.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_text_key_is_not_found() {
        let fx = fixture().await;
        let owner = Uuid::new_v4();
        let record = fx
            .repository
            .create(NewUploadRecord {
                name: "legacy".to_string(),
                original_filename: "legacy.zip".to_string(),
                size_label: "0.00 MB".to_string(),
                owner_id: Some(owner),
            })
            .await
            .unwrap();

        let err = fx.service.read_text(record.id, owner).await.unwrap_err();
        match err {
            AppError::NotFound(msg) => assert_eq!(msg, "File not found"),
            other => panic!("unexpected error: {:?}", other),
        }

        let report = fx.service.hard_delete(record.id).await.unwrap();
        assert_eq!(report.archive, FileRemoval::Missing);
        assert_eq!(report.text, FileRemoval::Missing);
    }
}
