use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use ziptext_core::models::{NewUploadRecord, UploadRecord};
use ziptext_core::AppError;

const RECORD_COLUMNS: &str = "id, name, original_filename, archive_key, text_key, created_at, size_label, is_active, owner_id";

/// Persistence of upload records.
///
/// Records are created without files; keys are attached once the files are
/// stored. Soft-deleted records stay readable by their owner through
/// `get_for_owner` but never appear in `list_active_by_owner`.
#[async_trait]
pub trait UploadRepository: Send + Sync {
    async fn create(&self, record: NewUploadRecord) -> Result<UploadRecord, AppError>;

    async fn attach_archive(&self, id: Uuid, archive_key: &str) -> Result<UploadRecord, AppError>;

    async fn attach_text(&self, id: Uuid, text_key: &str) -> Result<UploadRecord, AppError>;

    async fn get_for_owner(&self, id: Uuid, owner_id: Uuid)
        -> Result<Option<UploadRecord>, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<UploadRecord>, AppError>;

    /// Active records of one owner, newest first.
    async fn list_active_by_owner(&self, owner_id: Uuid) -> Result<Vec<UploadRecord>, AppError>;

    /// Mark a record inactive. Returns false when no record of this owner matched.
    async fn soft_delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool, AppError>;

    /// Remove the row. Returns false when it did not exist.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

/// PostgreSQL implementation over the `project_uploads` table.
#[derive(Clone)]
pub struct PgUploadRepository {
    pool: PgPool,
}

impl PgUploadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn set_key(&self, id: Uuid, column: &str, key: &str) -> Result<UploadRecord, AppError> {
        let sql = format!(
            "UPDATE project_uploads SET {} = $2 WHERE id = $1 RETURNING {}",
            column, RECORD_COLUMNS
        );
        sqlx::query_as::<Postgres, UploadRecord>(&sql)
            .bind(id)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project {} not found", id)))
    }
}

#[async_trait]
impl UploadRepository for PgUploadRepository {
    #[tracing::instrument(skip(self, record), fields(db.table = "project_uploads", db.operation = "insert"))]
    async fn create(&self, record: NewUploadRecord) -> Result<UploadRecord, AppError> {
        let sql = format!(
            r#"
            INSERT INTO project_uploads (name, original_filename, size_label, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            RECORD_COLUMNS
        );
        let created = sqlx::query_as::<Postgres, UploadRecord>(&sql)
            .bind(&record.name)
            .bind(&record.original_filename)
            .bind(&record.size_label)
            .bind(record.owner_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    #[tracing::instrument(skip(self), fields(db.table = "project_uploads", db.operation = "update", db.record_id = %id))]
    async fn attach_archive(&self, id: Uuid, archive_key: &str) -> Result<UploadRecord, AppError> {
        self.set_key(id, "archive_key", archive_key).await
    }

    #[tracing::instrument(skip(self), fields(db.table = "project_uploads", db.operation = "update", db.record_id = %id))]
    async fn attach_text(&self, id: Uuid, text_key: &str) -> Result<UploadRecord, AppError> {
        self.set_key(id, "text_key", text_key).await
    }

    #[tracing::instrument(skip(self), fields(db.table = "project_uploads", db.operation = "select", db.record_id = %id))]
    async fn get_for_owner(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<UploadRecord>, AppError> {
        let sql = format!(
            "SELECT {} FROM project_uploads WHERE id = $1 AND owner_id = $2",
            RECORD_COLUMNS
        );
        let record = sqlx::query_as::<Postgres, UploadRecord>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "project_uploads", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<UploadRecord>, AppError> {
        let sql = format!("SELECT {} FROM project_uploads WHERE id = $1", RECORD_COLUMNS);
        let record = sqlx::query_as::<Postgres, UploadRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "project_uploads", db.operation = "select"))]
    async fn list_active_by_owner(&self, owner_id: Uuid) -> Result<Vec<UploadRecord>, AppError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM project_uploads
            WHERE owner_id = $1 AND is_active = TRUE
            ORDER BY created_at DESC, id DESC
            "#,
            RECORD_COLUMNS
        );
        let records = sqlx::query_as::<Postgres, UploadRecord>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    #[tracing::instrument(skip(self), fields(db.table = "project_uploads", db.operation = "update", db.record_id = %id))]
    async fn soft_delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE project_uploads SET is_active = FALSE WHERE id = $1 AND owner_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "project_uploads", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM project_uploads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
