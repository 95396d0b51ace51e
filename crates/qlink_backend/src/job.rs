//! Job handles and job wire types.
//!
//! A [`CircuitJob`] tracks one server-side job; a [`CompositeJob`] is the
//! client-side aggregation created when an oversized program list is chunked
//! into several server jobs. Job methods are async; the blocking backend
//! facade drives them through its own runtime.

use crate::properties::BackendProperties;
use chrono::{DateTime, Utc};
use qlink_client::{ApiClient, ClientError, DeviceProperties};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Tag prefix reserved for composite sub-jobs; refused in user tags
pub const COMPOSITE_TAG_PREFIX: &str = "qlink_composite_job_";

/// Poll interval while waiting for a job to finish
const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Job errors
#[derive(Debug, Error)]
pub enum JobError {
    /// Client error
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// Job submission failed
    #[error("Job submission failed: {0}")]
    SubmissionFailed(String),

    /// Job execution failed
    #[error("Job execution failed: {0}")]
    ExecutionFailed(String),

    /// Job was cancelled
    #[error("Job was cancelled")]
    Cancelled,

    /// Job timed out
    #[error("Job timed out after {0} seconds")]
    Timeout(u64),

    /// Server response had an unexpected shape
    #[error("Unexpected server response: {0}")]
    Protocol(String),

    /// Results requested before the job finished
    #[error("Job results not yet available")]
    ResultsNotReady,
}

/// Job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Job is queued
    #[serde(alias = "queued", alias = "PENDING", alias = "pending")]
    Queued,

    /// Job is validating
    #[serde(alias = "validating")]
    Validating,

    /// Job is running
    #[serde(alias = "running")]
    Running,

    /// Job completed successfully
    #[serde(alias = "completed", alias = "DONE", alias = "done")]
    Completed,

    /// Job failed
    #[serde(alias = "failed", alias = "ERROR", alias = "error")]
    Failed,

    /// Job was cancelled
    #[serde(alias = "cancelled", alias = "CANCELED", alias = "canceled")]
    Cancelled,

    /// Unknown status
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// Check if the job is in a final state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Check if the job is still in flight
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Validating | Self::Running)
    }

    /// Check if the job completed successfully
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

// ============================================================================
// Wire Types
// ============================================================================

/// Application-level error embedded in a response body
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorInfo {
    /// Error code
    pub code: Option<i64>,

    /// Error message
    pub message: Option<String>,
}

impl ApiErrorInfo {
    fn describe(&self) -> String {
        match (&self.message, self.code) {
            (Some(msg), Some(code)) => format!("{} (code {})", msg, code),
            (Some(msg), None) => msg.clone(),
            (None, Some(code)) => format!("error code {}", code),
            (None, None) => "unknown error".to_string(),
        }
    }
}

/// Response to a job submission
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    /// Job id (absent or empty on some failure shapes)
    pub id: Option<String>,

    /// Initial status
    pub status: Option<JobStatus>,

    /// Creation time
    pub creation_date: Option<DateTime<Utc>>,

    /// Application-level error; present means the submission failed even if
    /// the HTTP exchange succeeded
    pub error: Option<ApiErrorInfo>,
}

/// A job as returned by the jobs endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct JobResponse {
    /// Job id
    pub id: String,

    /// Backend the job runs on
    pub backend: Option<String>,

    /// Current status
    pub status: Option<JobStatus>,

    /// Creation time
    pub creation_date: Option<DateTime<Utc>>,

    /// Job name
    pub name: Option<String>,

    /// Job tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Error details for failed jobs
    pub error: Option<ApiErrorInfo>,
}

/// Jobs list response
#[derive(Debug, Deserialize)]
pub(crate) struct JobsListResponse {
    pub(crate) jobs: Vec<JobResponse>,
}

/// Result for a single program of a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramResult {
    /// Whether this program executed successfully
    #[serde(default)]
    pub success: bool,

    /// Number of shots executed
    pub shots: Option<u64>,

    /// Measurement counts: bitstring → count
    pub counts: Option<HashMap<String, u64>>,

    /// Per-shot bitstrings, when `memory` was requested
    pub memory: Option<Vec<String>>,

    /// Execution time in seconds
    pub time_taken: Option<f64>,
}

/// Full job result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    /// Job id
    pub job_id: Option<String>,

    /// Per-program results, in submission order
    pub results: Vec<ProgramResult>,
}

// ============================================================================
// Single Job Handle
// ============================================================================

/// Handle to one server-side job
#[derive(Debug, Clone)]
pub struct CircuitJob {
    id: String,
    backend_name: String,
    client: ApiClient,
    status: JobStatus,
    creation_date: Option<DateTime<Utc>>,
    name: Option<String>,
    tags: Vec<String>,
}

impl CircuitJob {
    /// Build a handle from a submission response.
    ///
    /// An embedded `error` field always yields an error, never a handle; a
    /// success body without a non-empty id is a protocol violation.
    pub fn from_submission(
        response: SubmitResponse,
        client: ApiClient,
        backend_name: &str,
        name: Option<String>,
        tags: Vec<String>,
    ) -> Result<Self, JobError> {
        if let Some(error) = response.error {
            return Err(JobError::SubmissionFailed(error.describe()));
        }

        let id = match response.id {
            Some(id) if !id.is_empty() => id,
            _ => {
                return Err(JobError::Protocol(
                    "submission succeeded but no job id was returned".to_string(),
                ))
            }
        };

        Ok(Self {
            id,
            backend_name: backend_name.to_string(),
            client,
            status: response.status.unwrap_or(JobStatus::Queued),
            creation_date: response.creation_date,
            name,
            tags,
        })
    }

    /// Re-attach a handle to an existing job
    pub fn from_response(response: JobResponse, client: ApiClient) -> Self {
        Self {
            id: response.id,
            backend_name: response.backend.unwrap_or_default(),
            status: response.status.unwrap_or(JobStatus::Unknown),
            creation_date: response.creation_date,
            name: response.name,
            tags: response.tags,
            client,
        }
    }

    /// Job id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Backend the job was submitted to
    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    /// Last known status (call [`refresh`](Self::refresh) to update)
    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Creation time, when the server reported one
    pub fn creation_date(&self) -> Option<DateTime<Utc>> {
        self.creation_date
    }

    /// Job name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Job tags
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Query the server for the current status
    pub async fn refresh(&mut self) -> Result<JobStatus, JobError> {
        let path = format!("/jobs/{}", self.id);
        let response: JobResponse = self.client.get(&path).await?;
        self.status = response.status.unwrap_or(self.status);

        if self.status == JobStatus::Failed {
            if let Some(error) = response.error {
                return Err(JobError::ExecutionFailed(error.describe()));
            }
        }

        Ok(self.status)
    }

    /// Poll until the job reaches a final state
    pub async fn wait(&mut self, timeout: Duration) -> Result<JobStatus, JobError> {
        let start = std::time::Instant::now();

        loop {
            let status = self.refresh().await?;

            if status.is_terminal() {
                return match status {
                    JobStatus::Completed => Ok(status),
                    JobStatus::Failed => {
                        Err(JobError::ExecutionFailed("Job failed".to_string()))
                    }
                    JobStatus::Cancelled => Err(JobError::Cancelled),
                    _ => Ok(status),
                };
            }

            if start.elapsed() > timeout {
                return Err(JobError::Timeout(timeout.as_secs()));
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Fetch the job result; the job must be in a final state
    pub async fn result(&self) -> Result<JobResult, JobError> {
        if !self.status.is_terminal() {
            return Err(JobError::ResultsNotReady);
        }

        let path = format!("/jobs/{}/results", self.id);
        Ok(self.client.get(&path).await?)
    }

    /// Properties snapshot of the backend at the time this job ran
    pub async fn backend_properties(&self) -> Result<Option<BackendProperties>, JobError> {
        let path = format!("/jobs/{}/properties", self.id);
        let raw: serde_json::Value = self.client.get(&path).await?;
        if raw.is_null() || raw.as_object().map(|o| o.is_empty()).unwrap_or(false) {
            return Ok(None);
        }
        let api: DeviceProperties =
            serde_json::from_value(raw).map_err(|e| JobError::Protocol(e.to_string()))?;
        Ok(Some(BackendProperties::from_api(api)))
    }

    /// Cancel the job
    pub async fn cancel(&mut self) -> Result<(), JobError> {
        let path = format!("/jobs/{}", self.id);
        self.client.delete(&path).await?;
        self.status = JobStatus::Cancelled;
        Ok(())
    }
}

// ============================================================================
// Composite Job Handle
// ============================================================================

/// Client-side aggregation of the sub-jobs created by chunking
#[derive(Debug, Clone)]
pub struct CompositeJob {
    id: String,
    backend_name: String,
    jobs: Vec<CircuitJob>,
    name: Option<String>,
    tags: Vec<String>,
}

impl CompositeJob {
    /// Create a composite handle over ordered sub-jobs
    pub fn new(
        id: impl Into<String>,
        backend_name: impl Into<String>,
        jobs: Vec<CircuitJob>,
        name: Option<String>,
        tags: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            backend_name: backend_name.into(),
            jobs,
            name,
            tags,
        }
    }

    /// Client-side composite id (also the sub-jobs' `experiment_id`)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Backend the sub-jobs were submitted to
    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    /// The ordered sub-jobs
    pub fn jobs(&self) -> &[CircuitJob] {
        &self.jobs
    }

    /// Ordered sub-job ids
    pub fn job_ids(&self) -> Vec<&str> {
        self.jobs.iter().map(|j| j.id()).collect()
    }

    /// Job name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Job tags
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Aggregate status over the last known sub-job statuses.
    ///
    /// Any failure fails the composite; any cancellation cancels it; it
    /// completes only when every sub-job completed.
    pub fn status(&self) -> JobStatus {
        let statuses: Vec<JobStatus> = self.jobs.iter().map(|j| j.status()).collect();

        if statuses.iter().any(|s| *s == JobStatus::Failed) {
            JobStatus::Failed
        } else if statuses.iter().any(|s| *s == JobStatus::Cancelled) {
            JobStatus::Cancelled
        } else if statuses.iter().all(|s| *s == JobStatus::Completed) {
            JobStatus::Completed
        } else if statuses
            .iter()
            .any(|s| matches!(s, JobStatus::Running | JobStatus::Validating))
        {
            JobStatus::Running
        } else {
            JobStatus::Queued
        }
    }

    /// Refresh every sub-job and return the aggregate status
    pub async fn refresh(&mut self) -> Result<JobStatus, JobError> {
        for job in &mut self.jobs {
            // A failed sub-job surfaces through the aggregate status, not as
            // an early return, so the remaining statuses stay current.
            match job.refresh().await {
                Ok(_) | Err(JobError::ExecutionFailed(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(self.status())
    }

    /// Poll until every sub-job reaches a final state
    pub async fn wait(&mut self, timeout: Duration) -> Result<JobStatus, JobError> {
        let start = std::time::Instant::now();

        loop {
            let status = self.refresh().await?;

            if status.is_terminal() {
                return match status {
                    JobStatus::Completed => Ok(status),
                    JobStatus::Failed => {
                        Err(JobError::ExecutionFailed("A sub-job failed".to_string()))
                    }
                    JobStatus::Cancelled => Err(JobError::Cancelled),
                    _ => Ok(status),
                };
            }

            if start.elapsed() > timeout {
                return Err(JobError::Timeout(timeout.as_secs()));
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Fetch all sub-job results, in chunk order
    pub async fn results(&self) -> Result<Vec<JobResult>, JobError> {
        let mut results = Vec::with_capacity(self.jobs.len());
        for job in &self.jobs {
            results.push(job.result().await?);
        }
        Ok(results)
    }

    /// Cancel every sub-job
    pub async fn cancel(&mut self) -> Result<(), JobError> {
        for job in &mut self.jobs {
            job.cancel().await?;
        }
        Ok(())
    }
}

// ============================================================================
// Job Union
// ============================================================================

/// What a run returns: one server job, or a composite over chunked sub-jobs
#[derive(Debug, Clone)]
pub enum Job {
    /// Single server-side job
    Circuit(CircuitJob),

    /// Composite over chunked sub-jobs
    Composite(CompositeJob),
}

impl Job {
    /// Job id (composite id for chunked submissions)
    pub fn id(&self) -> &str {
        match self {
            Job::Circuit(job) => job.id(),
            Job::Composite(job) => job.id(),
        }
    }

    /// Last known (aggregate) status
    pub fn status(&self) -> JobStatus {
        match self {
            Job::Circuit(job) => job.status(),
            Job::Composite(job) => job.status(),
        }
    }

    /// Backend the job was submitted to
    pub fn backend_name(&self) -> &str {
        match self {
            Job::Circuit(job) => job.backend_name(),
            Job::Composite(job) => job.backend_name(),
        }
    }

    /// Borrow as a single job
    pub fn as_circuit(&self) -> Option<&CircuitJob> {
        match self {
            Job::Circuit(job) => Some(job),
            Job::Composite(_) => None,
        }
    }

    /// Borrow as a composite job
    pub fn as_composite(&self) -> Option<&CompositeJob> {
        match self {
            Job::Circuit(_) => None,
            Job::Composite(job) => Some(job),
        }
    }
}
