//! Append-only version chain per design. Version numbers start at 1 and grow
//! by one per save, with no gaps.

use crate::domain::design_job::{EditedBy, IrVersion};
use crate::domain::error::{AppError, Result};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

const INSERT_FIRST_VERSION: &str =
    "INSERT INTO ir_versions (id, design_id, version_no, ir_json, edited_by, created_at)
     SELECT ?, ?, 1, ?, ?, ?
     WHERE EXISTS (SELECT 1 FROM design_jobs WHERE id = ?)
     RETURNING version_no";

// Design existence, the next number and the insert are one statement, so the
// write lock is taken up front and concurrent saves serialize on it.
const INSERT_NEXT_VERSION: &str =
    "INSERT INTO ir_versions (id, design_id, version_no, ir_json, edited_by, created_at)
     SELECT ?, ?, COALESCE((SELECT MAX(version_no) FROM ir_versions WHERE design_id = ?), 0) + 1, ?, ?, ?
     WHERE EXISTS (SELECT 1 FROM design_jobs WHERE id = ?)
     RETURNING version_no";

pub struct IrVersionRepository {
    pool: SqlitePool,
}

impl IrVersionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Records the model output as version 1. A second call for the same
    /// design fails on the `(design_id, version_no)` constraint.
    pub async fn create_initial(&self, design_id: &str, ir_json: &str) -> Result<i64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to begin transaction: {e}")))?;

        let version_no = insert_initial_version(&mut tx, design_id, ir_json).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to commit version: {e}")))?;

        Ok(version_no)
    }

    /// Records a user edit as `max(version_no) + 1`.
    pub async fn append_user_edit(&self, design_id: &str, ir_json: &str) -> Result<i64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to begin transaction: {e}")))?;

        let inserted: Option<(i64,)> = sqlx::query_as(INSERT_NEXT_VERSION)
            .bind(Uuid::new_v4().to_string())
            .bind(design_id)
            .bind(design_id)
            .bind(ir_json)
            .bind(EditedBy::User.as_str())
            .bind(chrono::Utc::now().timestamp_millis())
            .bind(design_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to insert version: {e}")))?;

        let Some((version_no,)) = inserted else {
            return Err(AppError::DesignNotFound(design_id.to_string()));
        };

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to commit version: {e}")))?;

        Ok(version_no)
    }

    pub async fn get_latest(&self, design_id: &str) -> Result<Option<IrVersion>> {
        let version = sqlx::query_as::<_, IrVersionEntity>(
            "SELECT id, design_id, version_no, ir_json, edited_by, created_at
             FROM ir_versions WHERE design_id = ?
             ORDER BY version_no DESC LIMIT 1",
        )
        .bind(design_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch latest version: {e}")))?;

        version.map(|entity| entity.try_into()).transpose()
    }

    pub async fn list_versions(&self, design_id: &str) -> Result<Vec<IrVersion>> {
        let versions = sqlx::query_as::<_, IrVersionEntity>(
            "SELECT id, design_id, version_no, ir_json, edited_by, created_at
             FROM ir_versions WHERE design_id = ?
             ORDER BY version_no ASC",
        )
        .bind(design_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list versions: {e}")))?;

        versions.into_iter().map(|entity| entity.try_into()).collect()
    }
}

/// Writes version 1 on an open connection so callers can share a transaction.
pub(crate) async fn insert_initial_version(
    conn: &mut SqliteConnection,
    design_id: &str,
    ir_json: &str,
) -> Result<i64> {
    let inserted: Option<(i64,)> = sqlx::query_as(INSERT_FIRST_VERSION)
        .bind(Uuid::new_v4().to_string())
        .bind(design_id)
        .bind(ir_json)
        .bind(EditedBy::Model.as_str())
        .bind(chrono::Utc::now().timestamp_millis())
        .bind(design_id)
        .fetch_optional(conn)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert initial version: {e}")))?;

    inserted
        .map(|(version_no,)| version_no)
        .ok_or_else(|| AppError::DesignNotFound(design_id.to_string()))
}

#[derive(sqlx::FromRow)]
struct IrVersionEntity {
    id: String,
    design_id: String,
    version_no: i64,
    ir_json: String,
    edited_by: String,
    created_at: i64,
}

impl TryFrom<IrVersionEntity> for IrVersion {
    type Error = AppError;

    fn try_from(entity: IrVersionEntity) -> Result<Self> {
        let edited_by = EditedBy::parse(&entity.edited_by).ok_or_else(|| {
            AppError::DatabaseError(format!("Unknown editor: {}", entity.edited_by))
        })?;
        Ok(Self {
            id: entity.id,
            design_id: entity.design_id,
            version_no: entity.version_no,
            ir_json: entity.ir_json,
            edited_by,
            created_at: entity.created_at,
        })
    }
}
