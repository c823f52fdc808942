use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Session;
use crate::errors::AppError;
use crate::models::application::{ApplicationRow, CandidateSummary};
use crate::pipeline::enrichment::{analyze_video, audit_portfolio};
use crate::pipeline::orchestrator::{
    rerank_top_pass, score_pending_pass, sort_by_rank_then_score, sort_by_score_desc, PassReport,
};
use crate::pipeline::states::{PipelineAction, StateChange};
use crate::state::AppState;

/// POST /api/v1/jobs/:id/pipeline/score
pub async fn handle_score_pass(
    State(state): State<AppState>,
    session: Session,
    Path(job_id): Path<Uuid>,
) -> Result<Json<PassReport>, AppError> {
    session.require_recruiter()?;
    let report = score_pending_pass(
        state.store.as_ref(),
        state.artifacts.as_ref(),
        state.scoring.as_ref(),
        &state.leases,
        job_id,
    )
    .await?;
    Ok(Json(report))
}

/// POST /api/v1/jobs/:id/pipeline/rerank
pub async fn handle_rerank_pass(
    State(state): State<AppState>,
    session: Session,
    Path(job_id): Path<Uuid>,
) -> Result<Json<PassReport>, AppError> {
    session.require_recruiter()?;
    let report = rerank_top_pass(
        state.store.as_ref(),
        state.artifacts.as_ref(),
        state.scoring.as_ref(),
        &state.leases,
        job_id,
    )
    .await?;
    Ok(Json(report))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CohortSort {
    #[default]
    Score,
    Rank,
}

#[derive(Debug, Default, Deserialize)]
pub struct CohortQuery {
    #[serde(default)]
    pub sort: CohortSort,
}

/// GET /api/v1/jobs/:id/candidates
pub async fn handle_cohort(
    State(state): State<AppState>,
    session: Session,
    Path(job_id): Path<Uuid>,
    Query(query): Query<CohortQuery>,
) -> Result<Json<Vec<CandidateSummary>>, AppError> {
    session.require_recruiter()?;
    let mut cohort = state.store.applications_for_job(job_id).await?;
    match query.sort {
        CohortSort::Score => sort_by_score_desc(&mut cohort),
        CohortSort::Rank => sort_by_rank_then_score(&mut cohort),
    }
    Ok(Json(cohort.iter().map(ApplicationRow::summary).collect()))
}

/// POST /api/v1/applications/:id/analyze-video
pub async fn handle_analyze_video(
    State(state): State<AppState>,
    session: Session,
    Path(application_id): Path<Uuid>,
) -> Result<Json<ApplicationRow>, AppError> {
    session.require_recruiter()?;
    let app = analyze_video(
        state.store.as_ref(),
        state.artifacts.as_ref(),
        state.video.as_ref(),
        application_id,
    )
    .await?;
    Ok(Json(app))
}

/// POST /api/v1/applications/:id/audit-portfolio
pub async fn handle_audit_portfolio(
    State(state): State<AppState>,
    session: Session,
    Path(application_id): Path<Uuid>,
) -> Result<Json<ApplicationRow>, AppError> {
    session.require_recruiter()?;
    let app = audit_portfolio(state.store.as_ref(), state.audit.as_ref(), application_id).await?;
    Ok(Json(app))
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub action: PipelineAction,
}

/// POST /api/v1/applications/:id/transition
///
/// Manual hiring-track actions (send offer, hire, decline, reject). The
/// interview actions carry side records and must go through the interview
/// endpoints so both halves commit together.
pub async fn handle_transition(
    State(state): State<AppState>,
    session: Session,
    Path(application_id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<ApplicationRow>, AppError> {
    session.require_recruiter()?;

    if matches!(
        request.action,
        PipelineAction::ScheduleInterview
            | PipelineAction::CancelInterview
            | PipelineAction::CompleteInterview
    ) {
        return Err(AppError::Validation(
            "interview actions must use the interview endpoints".to_string(),
        ));
    }

    let app = state
        .store
        .application(application_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("application {application_id} not found")))?;
    let to = app.pipeline_state.transition(request.action)?;
    state
        .store
        .apply_transition(
            application_id,
            StateChange {
                from: app.pipeline_state,
                to,
            },
        )
        .await?;

    let refreshed = state
        .store
        .application(application_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("application {application_id} not found")))?;
    Ok(Json(refreshed))
}
