//! Job trigger that persists jobs in the `jobs` table.

use async_trait::async_trait;
use chrono::Utc;

use dataroom_core::error::AppError;
use dataroom_core::result::AppResult;
use dataroom_core::traits::job_trigger::{JobRequest, JobTrigger};
use dataroom_core::types::id::JobId;
use dataroom_entity::job::model::CreateJob;
use dataroom_entity::job::status::JobPriority;

use crate::repositories::JobRepository;

/// Enqueues delayed jobs for the background worker.
#[derive(Debug, Clone)]
pub struct PgJobTrigger {
    repo: JobRepository,
}

impl PgJobTrigger {
    /// Create a trigger on top of the job repository.
    pub fn new(repo: JobRepository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl JobTrigger for PgJobTrigger {
    async fn trigger(&self, request: JobRequest) -> AppResult<JobId> {
        let delay = chrono::Duration::from_std(request.delay)
            .map_err(|e| AppError::validation(format!("Invalid job delay: {e}")))?;

        let job = self
            .repo
            .create(&CreateJob {
                job_type: request.job_type,
                queue: request.queue,
                priority: JobPriority::Normal,
                payload: request.payload,
                max_attempts: request.max_attempts,
                scheduled_at: Some(Utc::now() + delay),
            })
            .await?;

        tracing::debug!(
            job_id = %job.id,
            job_type = %job.job_type,
            queue = %job.queue,
            "Enqueued job"
        );

        Ok(job.id)
    }
}
