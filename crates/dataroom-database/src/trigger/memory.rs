//! Job trigger that only records what it was asked to schedule.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use dataroom_core::error::AppError;
use dataroom_core::result::AppResult;
use dataroom_core::traits::job_trigger::{JobRequest, JobTrigger};
use dataroom_core::types::id::JobId;

/// Records every triggered job. Can be switched to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingJobTrigger {
    requests: Arc<Mutex<Vec<JobRequest>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingJobTrigger {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent triggers fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Requests recorded so far, in order.
    pub async fn requests(&self) -> Vec<JobRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl JobTrigger for RecordingJobTrigger {
    async fn trigger(&self, request: JobRequest) -> AppResult<JobId> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::external("Job queue unavailable"));
        }
        self.requests.lock().await.push(request);
        Ok(JobId::new())
    }
}
