mod generator;
mod llm_output;
mod post_process;
mod prompts;
mod retry;

pub use generator::{GenerationOrchestrator, DEFAULT_MODEL_ID};
pub use post_process::{compare_case_names, finalize_generated_ir, new_row_id, test_type_rank};

use crate::domain::design_ir::DesignIr;
use crate::domain::design_job::{DesignJob, JobStatus};
use crate::domain::error::{AppError, Result};
use crate::domain::generation::{DesignRequest, GenerationRequest};
use crate::infrastructure::db::design_jobs::DesignJobRepository;
use crate::infrastructure::db::ir_versions::IrVersionRepository;
use crate::infrastructure::db::profiles::ProfileRepository;
use crate::infrastructure::rules::CoverageRuleLoader;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize)]
pub struct DesignOutcome {
    pub design_id: String,
    pub ir: DesignIr,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatestVersion {
    pub version_no: i64,
    pub ir: DesignIr,
}

pub struct DesignUseCase {
    profiles: Arc<ProfileRepository>,
    jobs: Arc<DesignJobRepository>,
    versions: Arc<IrVersionRepository>,
    rules: CoverageRuleLoader,
    orchestrator: GenerationOrchestrator,
}

impl DesignUseCase {
    pub fn new(
        profiles: Arc<ProfileRepository>,
        jobs: Arc<DesignJobRepository>,
        versions: Arc<IrVersionRepository>,
        rules: CoverageRuleLoader,
        orchestrator: GenerationOrchestrator,
    ) -> Self {
        Self {
            profiles,
            jobs,
            versions,
            rules,
            orchestrator,
        }
    }

    /// Generates a design, records the attempt as a job either way, and on
    /// success stores the document as version 1.
    pub async fn generate(&self, input: DesignRequest) -> Result<DesignOutcome> {
        let input = input.normalized();
        input
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let profile = self.profiles.get_profile(input.profile_id).await?;
        let rule = self.rules.load(input.coverage_level)?;
        let rules_text = rule.to_prompt_text();

        let request = GenerationRequest::from_design(&input, &profile, rules_text);
        request
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let mut job = DesignJob {
            id: Uuid::new_v4().to_string(),
            profile_id: Some(profile.id),
            suite_name: request.suite_name.clone(),
            coverage_level: request.coverage_level.to_string(),
            element_steps_text: request.element_steps_text.clone(),
            spec_text: request.spec_text.clone(),
            rules_snapshot_text: request.rules_text.clone(),
            status: JobStatus::Error,
            llm_model_name: Some(GenerationOrchestrator::requested_model(&request).to_string()),
            llm_request_json: None,
            llm_response_json: None,
            error_message: None,
            created_at: chrono::Utc::now().timestamp_millis(),
        };

        let result = match self.orchestrator.generate_with_retry(&request).await {
            Ok(result) => result,
            Err(e) => {
                if let AppError::InvalidLlmOutput { raw_text, .. } = &e {
                    job.llm_response_json = Some(raw_text.clone());
                }
                job.error_message = Some(e.to_string());
                self.record_failed_job(&job).await;
                return Err(e);
            }
        };

        job.llm_model_name = Some(result.model_name.clone());
        job.llm_request_json = Some(result.request_payload.to_string());
        job.llm_response_json = Some(result.response_raw.clone());

        let ir = match finalize_generated_ir(result.ir_json) {
            Ok(ir) => ir,
            Err(e) => {
                job.error_message = Some(e.to_string());
                self.record_failed_job(&job).await;
                return Err(e);
            }
        };

        let ir_json = serde_json::to_string(&ir)
            .map_err(|e| AppError::Internal(format!("Failed to serialize design: {}", e)))?;

        job.status = JobStatus::Success;
        if let Err(e) = self.jobs.insert_with_initial_version(&job, &ir_json).await {
            job.status = JobStatus::Error;
            job.error_message = Some(e.to_string());
            self.record_failed_job(&job).await;
            return Err(e);
        }

        info!(
            design_id = %job.id,
            rows = ir.rows.len(),
            model = %result.model_name,
            "Test design generated"
        );
        Ok(DesignOutcome {
            design_id: job.id,
            ir,
        })
    }

    /// Stores a user-edited document as the next version.
    pub async fn save_edit(&self, design_id: &str, ir: DesignIr) -> Result<i64> {
        let ir = ir.normalized()?;
        let ir_json = serde_json::to_string(&ir)
            .map_err(|e| AppError::Internal(format!("Failed to serialize design: {}", e)))?;
        let version_no = self.versions.append_user_edit(design_id, &ir_json).await?;
        info!(design_id = %design_id, version_no, "Saved design edit");
        Ok(version_no)
    }

    pub async fn latest(&self, design_id: &str) -> Result<LatestVersion> {
        let version = self
            .versions
            .get_latest(design_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No versions for design: {}", design_id)))?;
        let ir: DesignIr = serde_json::from_str(&version.ir_json).map_err(|e| {
            AppError::Internal(format!(
                "Stored version {} of {} is unreadable: {}",
                version.version_no, design_id, e
            ))
        })?;
        Ok(LatestVersion {
            version_no: version.version_no,
            ir,
        })
    }

    pub async fn get_job(&self, design_id: &str) -> Result<DesignJob> {
        self.jobs.get_job(design_id).await
    }

    pub async fn list_jobs(&self, limit: Option<i64>) -> Result<Vec<DesignJob>> {
        let limit = match limit {
            Some(value) if value > 0 => value.min(500),
            _ => 50,
        };
        self.jobs.list_jobs(limit).await
    }

    async fn record_failed_job(&self, job: &DesignJob) {
        warn!(
            design_id = %job.id,
            error = job.error_message.as_deref().unwrap_or_default(),
            "Test design generation failed"
        );
        if let Err(e) = self.jobs.insert_job(job).await {
            error!(design_id = %job.id, error = %e, "Failed to record failed design job");
        }
    }
}
