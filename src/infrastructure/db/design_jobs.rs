use crate::domain::design_job::{DesignJob, JobStatus};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::db::ir_versions::insert_initial_version;
use sqlx::{SqliteConnection, SqlitePool};

pub struct DesignJobRepository {
    pool: SqlitePool,
}

impl DesignJobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert_job(&self, job: &DesignJob) -> Result<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to acquire connection: {e}")))?;
        insert_job_row(&mut conn, job).await
    }

    /// Stores a successful job together with its version 1; neither row is
    /// kept if either insert fails.
    pub async fn insert_with_initial_version(&self, job: &DesignJob, ir_json: &str) -> Result<i64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to begin transaction: {e}")))?;

        insert_job_row(&mut tx, job).await?;
        let version_no = insert_initial_version(&mut tx, &job.id, ir_json).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to commit design: {e}")))?;

        Ok(version_no)
    }

    pub async fn get_job(&self, job_id: &str) -> Result<DesignJob> {
        let job = sqlx::query_as::<_, DesignJobEntity>(
            "SELECT id, profile_id, suite_name, coverage_level, element_steps_text, spec_text,
                rules_snapshot_text, status, llm_model_name, llm_request_json, llm_response_json,
                error_message, created_at
             FROM design_jobs WHERE id = ?",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch design job: {e}")))?;

        match job {
            Some(job) => job.try_into(),
            None => Err(AppError::DesignNotFound(job_id.to_string())),
        }
    }

    pub async fn list_jobs(&self, limit: i64) -> Result<Vec<DesignJob>> {
        let jobs = sqlx::query_as::<_, DesignJobEntity>(
            "SELECT id, profile_id, suite_name, coverage_level, element_steps_text, spec_text,
                rules_snapshot_text, status, llm_model_name, llm_request_json, llm_response_json,
                error_message, created_at
             FROM design_jobs ORDER BY created_at DESC, rowid DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list design jobs: {e}")))?;

        jobs.into_iter().map(|job| job.try_into()).collect()
    }
}

async fn insert_job_row(conn: &mut SqliteConnection, job: &DesignJob) -> Result<()> {
    sqlx::query(
        "INSERT INTO design_jobs (id, profile_id, suite_name, coverage_level, element_steps_text,
            spec_text, rules_snapshot_text, status, llm_model_name, llm_request_json,
            llm_response_json, error_message, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&job.id)
    .bind(job.profile_id)
    .bind(&job.suite_name)
    .bind(&job.coverage_level)
    .bind(&job.element_steps_text)
    .bind(&job.spec_text)
    .bind(&job.rules_snapshot_text)
    .bind(job.status.as_str())
    .bind(&job.llm_model_name)
    .bind(&job.llm_request_json)
    .bind(&job.llm_response_json)
    .bind(&job.error_message)
    .bind(job.created_at)
    .execute(conn)
    .await
    .map_err(|e| AppError::DatabaseError(format!("Failed to insert design job: {e}")))?;

    Ok(())
}

#[derive(sqlx::FromRow)]
struct DesignJobEntity {
    id: String,
    profile_id: Option<i64>,
    suite_name: String,
    coverage_level: String,
    element_steps_text: String,
    spec_text: String,
    rules_snapshot_text: String,
    status: String,
    llm_model_name: Option<String>,
    llm_request_json: Option<String>,
    llm_response_json: Option<String>,
    error_message: Option<String>,
    created_at: i64,
}

impl TryFrom<DesignJobEntity> for DesignJob {
    type Error = AppError;

    fn try_from(entity: DesignJobEntity) -> Result<Self> {
        let status = JobStatus::parse(&entity.status).ok_or_else(|| {
            AppError::DatabaseError(format!("Unknown design job status: {}", entity.status))
        })?;
        Ok(Self {
            id: entity.id,
            profile_id: entity.profile_id,
            suite_name: entity.suite_name,
            coverage_level: entity.coverage_level,
            element_steps_text: entity.element_steps_text,
            spec_text: entity.spec_text,
            rules_snapshot_text: entity.rules_snapshot_text,
            status,
            llm_model_name: entity.llm_model_name,
            llm_request_json: entity.llm_request_json,
            llm_response_json: entity.llm_response_json,
            error_message: entity.error_message,
            created_at: entity.created_at,
        })
    }
}
