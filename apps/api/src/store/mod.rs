//! Durable storage for applications, jobs and interviews.
//!
//! The `Store` trait is the document-store boundary: it exposes exactly the
//! query shapes the core depends on (applications by job / applicant /
//! state, interviews by time) plus the mutations that must be atomic.
//! `PgStore` is the production implementation; tests run against the
//! in-memory one.
//!
//! Writes are authoritative: callers get the result only after the durable
//! write succeeded or failed explicitly. Optimistic rendering is a UI
//! concern, not baked in here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::application::ApplicationRow;
use crate::models::interview::{InterviewKind, InterviewRow};
use crate::models::job::JobRow;
use crate::pipeline::merger::LayerUpdate;
use crate::pipeline::states::{PipelineState, StateChange};

#[cfg(test)]
pub mod memory;
pub mod pg;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    NotFound(String),

    /// A guarded write found stale state (concurrent change, duplicate
    /// application, filled position). The write did not happen.
    #[error("{0}")]
    Conflict(String),
}

/// Fields the submission flow provides; id, timestamps and the initial
/// `submitted` state are the store's business.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub applicant_name: String,
    pub applicant_email: String,
    pub applicant_phone: String,
    pub resume_url: Option<String>,
    pub video_url: Option<String>,
    pub layer1_qualified: bool,
    pub layer1_reasons: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewInterview {
    pub application_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub kind: InterviewKind,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn job(&self, id: Uuid) -> Result<Option<JobRow>, StoreError>;

    async fn application(&self, id: Uuid) -> Result<Option<ApplicationRow>, StoreError>;

    async fn applications_for_job(&self, job_id: Uuid)
        -> Result<Vec<ApplicationRow>, StoreError>;

    async fn applications_for_applicant(
        &self,
        applicant_id: Uuid,
    ) -> Result<Vec<ApplicationRow>, StoreError>;

    async fn applications_in_state(
        &self,
        state: PipelineState,
    ) -> Result<Vec<ApplicationRow>, StoreError>;

    /// Inserts the application and bumps the job's applicant count in one
    /// transaction. Duplicate (applicant, job) pairs and filled positions
    /// come back as `Conflict`.
    async fn create_application(
        &self,
        new: NewApplication,
    ) -> Result<ApplicationRow, StoreError>;

    /// Applies one merged partial update. Updates that carry a state change
    /// are guarded on the expected current state and the whole statement is
    /// one atomic write — a torn half-write across layer sub-fields cannot
    /// happen.
    async fn apply_update(&self, id: Uuid, update: &LayerUpdate) -> Result<(), StoreError>;

    /// Applies a bare state transition, guarded on the expected `from`.
    async fn apply_transition(&self, id: Uuid, change: StateChange) -> Result<(), StoreError>;

    async fn interview(&self, id: Uuid) -> Result<Option<InterviewRow>, StoreError>;

    async fn interviews_ordered(&self) -> Result<Vec<InterviewRow>, StoreError>;

    /// Creates the interview and advances the application in one
    /// transaction; if either half fails, neither is committed.
    async fn schedule_interview(
        &self,
        change: StateChange,
        new: NewInterview,
    ) -> Result<InterviewRow, StoreError>;

    /// Deletes the interview and reverts the application in one
    /// transaction.
    async fn cancel_interview(
        &self,
        interview_id: Uuid,
        application_id: Uuid,
        change: StateChange,
    ) -> Result<(), StoreError>;

    /// Marks the interview completed and advances the application in one
    /// transaction.
    async fn complete_interview(
        &self,
        interview_id: Uuid,
        application_id: Uuid,
        change: StateChange,
    ) -> Result<(), StoreError>;
}
