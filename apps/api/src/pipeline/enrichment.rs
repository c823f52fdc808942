//! Single-candidate enrichment: video analysis and portfolio audit.
//!
//! Both are on-demand, not batched: fetch one artifact (or reuse the stored
//! extraction), call the service, merge, persist. Unlike batch passes, an
//! unreachable artifact here is a hard failure reported to the operator.

use tracing::info;
use uuid::Uuid;

use crate::clients::{ArtifactFetcher, AuditRequest, PortfolioAuditor, VideoAnalyzer};
use crate::errors::AppError;
use crate::models::application::ApplicationRow;
use crate::pipeline::merger::{merge_audit, merge_video};
use crate::store::Store;

async fn load_application(store: &dyn Store, id: Uuid) -> Result<ApplicationRow, AppError> {
    store
        .application(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("application {id} not found")))
}

/// Runs the behavioral analysis on a candidate's video introduction and
/// merges the result into the layer-3 video fields.
pub async fn analyze_video(
    store: &dyn Store,
    artifacts: &dyn ArtifactFetcher,
    analyzer: &dyn VideoAnalyzer,
    application_id: Uuid,
) -> Result<ApplicationRow, AppError> {
    let app = load_application(store, application_id).await?;
    let url = app.video_url.as_deref().ok_or_else(|| {
        AppError::Validation(format!(
            "application {application_id} has no video reference"
        ))
    })?;

    let artifact = artifacts.fetch(url).await?;
    let response = analyzer.analyze("interview_video.mp4", artifact.bytes).await?;

    let update = merge_video(&response);
    store.apply_update(application_id, &update).await?;
    info!("Video analysis merged for application {application_id}");

    load_application(store, application_id).await
}

/// Audits a candidate's portfolio against their resume claims.
///
/// Precondition: a scoring pass must already have produced the resume
/// extraction — the audit service consumes it. Calling this without one is
/// a validation error and performs zero writes.
pub async fn audit_portfolio(
    store: &dyn Store,
    auditor: &dyn PortfolioAuditor,
    application_id: Uuid,
) -> Result<ApplicationRow, AppError> {
    let app = load_application(store, application_id).await?;
    let extracted = app.extracted.as_ref().ok_or_else(|| {
        AppError::Validation(format!(
            "application {application_id} has no extracted resume data — run a scoring pass first"
        ))
    })?;

    let request = AuditRequest::from_extracted(extracted);
    let report = auditor.audit(&request).await?;

    let update = merge_audit(&report);
    store.apply_update(application_id, &update).await?;
    info!("Portfolio audit merged for application {application_id}");

    load_application(store, application_id).await
}
