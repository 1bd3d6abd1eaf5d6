use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;
use ziptext_core::models::{NewUploadRecord, UploadRecord};
use ziptext_core::AppError;

use super::upload::UploadRepository;

/// Upload repository held in process memory.
///
/// Clones share the same records.
#[derive(Clone, Default)]
pub struct InMemoryUploadRepository {
    records: Arc<Mutex<Vec<UploadRecord>>>,
}

impl InMemoryUploadRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed record, e.g. a legacy row or a fixture.
    pub fn insert(&self, record: UploadRecord) -> Result<(), AppError> {
        self.lock()?.push(record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<UploadRecord>>, AppError> {
        self.records
            .lock()
            .map_err(|_| AppError::Internal("upload repository lock poisoned".to_string()))
    }

    fn update<F>(&self, id: Uuid, apply: F) -> Result<UploadRecord, AppError>
    where
        F: FnOnce(&mut UploadRecord),
    {
        let mut records = self.lock()?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Project {} not found", id)))?;
        apply(record);
        Ok(record.clone())
    }
}

#[async_trait]
impl UploadRepository for InMemoryUploadRepository {
    async fn create(&self, record: NewUploadRecord) -> Result<UploadRecord, AppError> {
        let created = UploadRecord {
            id: Uuid::new_v4(),
            name: record.name,
            original_filename: record.original_filename,
            archive_key: None,
            text_key: None,
            created_at: Utc::now(),
            size_label: record.size_label,
            is_active: true,
            owner_id: record.owner_id,
        };
        self.lock()?.push(created.clone());
        Ok(created)
    }

    async fn attach_archive(&self, id: Uuid, archive_key: &str) -> Result<UploadRecord, AppError> {
        self.update(id, |r| r.archive_key = Some(archive_key.to_string()))
    }

    async fn attach_text(&self, id: Uuid, text_key: &str) -> Result<UploadRecord, AppError> {
        self.update(id, |r| r.text_key = Some(text_key.to_string()))
    }

    async fn get_for_owner(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<UploadRecord>, AppError> {
        Ok(self
            .lock()?
            .iter()
            .find(|r| r.id == id && r.owner_id == Some(owner_id))
            .cloned())
    }

    async fn get(&self, id: Uuid) -> Result<Option<UploadRecord>, AppError> {
        Ok(self.lock()?.iter().find(|r| r.id == id).cloned())
    }

    async fn list_active_by_owner(&self, owner_id: Uuid) -> Result<Vec<UploadRecord>, AppError> {
        // Latest insertion first, so equal timestamps keep newest-first order
        let mut records: Vec<UploadRecord> = self
            .lock()?
            .iter()
            .rev()
            .filter(|r| r.is_active && r.owner_id == Some(owner_id))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn soft_delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool, AppError> {
        let mut records = self.lock()?;
        match records
            .iter_mut()
            .find(|r| r.id == id && r.owner_id == Some(owner_id))
        {
            Some(record) => {
                record.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut records = self.lock()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_record(name: &str, owner_id: Uuid) -> NewUploadRecord {
        NewUploadRecord {
            name: name.to_string(),
            original_filename: format!("{}.zip", name),
            size_label: "0.01 MB".to_string(),
            owner_id: Some(owner_id),
        }
    }

    #[tokio::test]
    async fn test_create_starts_active_without_files() {
        let repo = InMemoryUploadRepository::new();
        let owner = Uuid::new_v4();

        let record = repo.create(new_record("site", owner)).await.unwrap();

        assert!(record.is_active);
        assert!(record.archive_key.is_none());
        assert!(record.text_key.is_none());
        assert_eq!(record.owner_id, Some(owner));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_attach_keys() {
        let repo = InMemoryUploadRepository::new();
        let owner = Uuid::new_v4();
        let record = repo.create(new_record("site", owner)).await.unwrap();

        repo.attach_archive(record.id, "zips/a/site.zip").await.unwrap();
        let updated = repo.attach_text(record.id, "text_files/a/site.txt").await.unwrap();

        assert_eq!(updated.archive_key.as_deref(), Some("zips/a/site.zip"));
        assert_eq!(updated.text_key.as_deref(), Some("text_files/a/site.txt"));

        let missing = repo.attach_text(Uuid::new_v4(), "x").await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_records_are_scoped_to_owner() {
        let repo = InMemoryUploadRepository::new();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let record = repo.create(new_record("site", owner)).await.unwrap();

        assert!(repo.get_for_owner(record.id, owner).await.unwrap().is_some());
        assert!(repo.get_for_owner(record.id, stranger).await.unwrap().is_none());
        assert!(repo.get(record.id).await.unwrap().is_some());
        assert!(repo.list_active_by_owner(stranger).await.unwrap().is_empty());
        assert!(!repo.soft_delete(record.id, stranger).await.unwrap());
    }

    #[tokio::test]
    async fn test_history_newest_first_and_active_only() {
        let repo = InMemoryUploadRepository::new();
        let owner = Uuid::new_v4();

        let mut older = repo.create(new_record("older", owner)).await.unwrap();
        older.created_at -= Duration::hours(1);
        repo.delete(older.id).await.unwrap();
        repo.insert(older.clone()).unwrap();

        let newer = repo.create(new_record("newer", owner)).await.unwrap();
        let hidden = repo.create(new_record("hidden", owner)).await.unwrap();
        assert!(repo.soft_delete(hidden.id, owner).await.unwrap());

        let history = repo.list_active_by_owner(owner).await.unwrap();
        let names: Vec<&str> = history.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["newer", "older"]);
        assert_eq!(history[0].id, newer.id);

        let inactive = repo.get_for_owner(hidden.id, owner).await.unwrap().unwrap();
        assert!(!inactive.is_active);
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let repo = InMemoryUploadRepository::new();
        let record = repo.create(new_record("site", Uuid::new_v4())).await.unwrap();

        assert!(repo.delete(record.id).await.unwrap());
        assert!(!repo.delete(record.id).await.unwrap());
        assert!(repo.get(record.id).await.unwrap().is_none());
        assert!(repo.is_empty());
    }
}
