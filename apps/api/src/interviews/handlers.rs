use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::Session;
use crate::errors::AppError;
use crate::interviews::schedule::{cancel, complete, schedule, ScheduleRequest};
use crate::models::interview::InterviewRow;
use crate::state::AppState;

/// POST /api/v1/applications/:id/interviews
pub async fn handle_schedule(
    State(state): State<AppState>,
    session: Session,
    Path(application_id): Path<Uuid>,
    Json(request): Json<ScheduleRequest>,
) -> Result<Json<InterviewRow>, AppError> {
    session.require_recruiter()?;
    let interview = schedule(state.store.as_ref(), application_id, request).await?;
    Ok(Json(interview))
}

/// DELETE /api/v1/interviews/:id — cancels and reverts the application.
pub async fn handle_cancel(
    State(state): State<AppState>,
    session: Session,
    Path(interview_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    session.require_recruiter()?;
    cancel(state.store.as_ref(), interview_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/interviews/:id/complete
pub async fn handle_complete(
    State(state): State<AppState>,
    session: Session,
    Path(interview_id): Path<Uuid>,
) -> Result<Json<InterviewRow>, AppError> {
    session.require_recruiter()?;
    let interview = complete(state.store.as_ref(), interview_id).await?;
    Ok(Json(interview))
}

/// GET /api/v1/interviews — ordered by scheduled time.
pub async fn handle_list(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<InterviewRow>>, AppError> {
    session.require_recruiter()?;
    let interviews = state.store.interviews_ordered().await?;
    Ok(Json(interviews))
}
