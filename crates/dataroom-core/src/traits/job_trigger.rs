//! Job trigger trait for downstream work scheduled after a tree mutation.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::types::id::JobId;

/// A request to schedule a background job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Job type identifier (e.g., `"dataroom_change_notification"`).
    pub job_type: String,
    /// Queue name.
    pub queue: String,
    /// Job-specific payload (JSON).
    pub payload: serde_json::Value,
    /// How long to wait before the job becomes runnable.
    pub delay: Duration,
    /// Maximum execution attempts.
    pub max_attempts: i32,
}

/// Trait for job backends that accept delayed work.
///
/// Callers treat a trigger as fire-and-forget: a failure here is reported
/// back but never undoes the mutation that caused it.
#[async_trait]
pub trait JobTrigger: Send + Sync + std::fmt::Debug + 'static {
    /// Schedule a job and return its identifier.
    async fn trigger(&self, request: JobRequest) -> AppResult<JobId>;
}
