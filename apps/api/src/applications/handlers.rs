use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::applications::submit::{submit_application, SubmitRequest};
use crate::auth::Session;
use crate::errors::AppError;
use crate::models::application::ApplicationRow;
use crate::pipeline::states::PipelineState;
use crate::state::AppState;

/// POST /api/v1/jobs/:id/applications
pub async fn handle_submit(
    State(state): State<AppState>,
    session: Session,
    Path(job_id): Path<Uuid>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<ApplicationRow>, AppError> {
    let app = submit_application(state.store.as_ref(), job_id, session, request).await?;
    Ok(Json(app))
}

/// GET /api/v1/applications/mine — the caller's own applications.
pub async fn handle_my_applications(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<ApplicationRow>>, AppError> {
    let apps = state
        .store
        .applications_for_applicant(session.actor_id)
        .await?;
    Ok(Json(apps))
}

#[derive(Debug, Deserialize)]
pub struct StateQuery {
    pub state: PipelineState,
}

/// GET /api/v1/applications?state=shortlisted
pub async fn handle_applications_in_state(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<StateQuery>,
) -> Result<Json<Vec<ApplicationRow>>, AppError> {
    session.require_recruiter()?;
    let apps = state.store.applications_in_state(query.state).await?;
    Ok(Json(apps))
}

/// GET /api/v1/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationRow>, AppError> {
    let app = state
        .store
        .application(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("application {id} not found")))?;
    // Applicants only see their own applications.
    if session.require_recruiter().is_err() && app.applicant_id != session.actor_id {
        return Err(AppError::Forbidden);
    }
    Ok(Json(app))
}
