//! Application submission.
//!
//! Creates the one-and-only application for an (applicant, job) pair:
//! re-application is rejected outright, never merged. The layer-1
//! qualification gate runs here, once; its verdict is immutable afterwards
//! unless the application is reprocessed wholesale.

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::Session;
use crate::errors::AppError;
use crate::models::application::ApplicationRow;
use crate::models::job::JobStatus;
use crate::store::{NewApplication, Store};

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub applicant_name: String,
    pub applicant_email: String,
    #[serde(default)]
    pub applicant_phone: Option<String>,
    #[serde(default)]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

/// The layer-1 gate: cheap checks that do not need any external service.
/// A failing gate still creates the application — terminal filtering is the
/// recruiter's call — but the reasons are on record.
fn qualification_gate(request: &SubmitRequest) -> (bool, Vec<String>) {
    let mut reasons = Vec::new();
    if request.resume_url.as_deref().map_or(true, str::is_empty) {
        reasons.push("no resume attached".to_string());
    }
    if request.video_url.as_deref().map_or(true, str::is_empty) {
        reasons.push("no video introduction attached".to_string());
    }
    (reasons.is_empty(), reasons)
}

pub async fn submit_application(
    store: &dyn Store,
    job_id: Uuid,
    session: Session,
    request: SubmitRequest,
) -> Result<ApplicationRow, AppError> {
    session.require_applicant()?;

    let job = store
        .job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("job {job_id} not found")))?;
    if job.status != JobStatus::Active {
        return Err(AppError::Validation(
            "job is not open for applications".to_string(),
        ));
    }

    let (qualified, reasons) = qualification_gate(&request);

    // The store enforces the unique (applicant, job) pair and the applicant
    // cap transactionally; both surface as validation errors.
    let app = store
        .create_application(NewApplication {
            job_id,
            applicant_id: session.actor_id,
            applicant_name: request.applicant_name,
            applicant_email: request.applicant_email,
            applicant_phone: request.applicant_phone.unwrap_or_default(),
            resume_url: request.resume_url,
            video_url: request.video_url,
            layer1_qualified: qualified,
            layer1_reasons: reasons,
        })
        .await?;

    info!(
        "Application {} submitted for job {job_id} (qualified: {})",
        app.id, app.layer1_qualified
    );
    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::pipeline::states::PipelineState;
    use crate::store::memory::MemoryStore;
    use crate::testutil::active_job;

    fn applicant() -> Session {
        Session {
            actor_id: Uuid::new_v4(),
            role: Role::Applicant,
        }
    }

    fn request() -> SubmitRequest {
        SubmitRequest {
            applicant_name: "Sarah Chen".to_string(),
            applicant_email: "sarah@example.com".to_string(),
            applicant_phone: None,
            resume_url: Some("https://blobs.example/resume.pdf".to_string()),
            video_url: Some("https://blobs.example/intro.mp4".to_string()),
        }
    }

    #[tokio::test]
    async fn test_submission_creates_submitted_application() {
        let store = MemoryStore::new();
        let job = active_job("AI Engineer");
        let job_id = job.id;
        store.insert_job(job);

        let app = submit_application(&store, job_id, applicant(), request())
            .await
            .unwrap();
        assert_eq!(app.pipeline_state, PipelineState::Submitted);
        assert!(app.layer1_qualified);
        assert!(app.layer1_reasons.is_empty());

        let counted = store.job(job_id).await.unwrap().unwrap();
        assert_eq!(counted.applicant_count, 1);
    }

    #[tokio::test]
    async fn test_reapplication_rejected_not_merged() {
        let store = MemoryStore::new();
        let job = active_job("AI Engineer");
        let job_id = job.id;
        store.insert_job(job);
        let session = applicant();

        submit_application(&store, job_id, session, request())
            .await
            .unwrap();
        let second = submit_application(&store, job_id, session, request()).await;
        assert!(matches!(second, Err(AppError::Validation(_))));

        let counted = store.job(job_id).await.unwrap().unwrap();
        assert_eq!(counted.applicant_count, 1);
    }

    #[tokio::test]
    async fn test_draft_job_rejects_submissions() {
        let store = MemoryStore::new();
        let mut job = active_job("Stealth Role");
        job.status = JobStatus::Draft;
        let job_id = job.id;
        store.insert_job(job);

        let result = submit_application(&store, job_id, applicant(), request()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_full_position_rejects_submissions() {
        let store = MemoryStore::new();
        let mut job = active_job("Popular Role");
        job.max_applicants = Some(1);
        let job_id = job.id;
        store.insert_job(job);

        submit_application(&store, job_id, applicant(), request())
            .await
            .unwrap();
        let overflow = submit_application(&store, job_id, applicant(), request()).await;
        assert!(matches!(overflow, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_gate_records_missing_artifacts() {
        let store = MemoryStore::new();
        let job = active_job("AI Engineer");
        let job_id = job.id;
        store.insert_job(job);

        let mut incomplete = request();
        incomplete.video_url = None;
        let app = submit_application(&store, job_id, applicant(), incomplete)
            .await
            .unwrap();
        assert!(!app.layer1_qualified);
        assert_eq!(app.layer1_reasons, vec!["no video introduction attached"]);
    }

    #[tokio::test]
    async fn test_recruiters_cannot_submit() {
        let store = MemoryStore::new();
        let job = active_job("AI Engineer");
        let job_id = job.id;
        store.insert_job(job);

        let recruiter = Session {
            actor_id: Uuid::new_v4(),
            role: Role::Recruiter,
        };
        let result = submit_application(&store, job_id, recruiter, request()).await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }
}
