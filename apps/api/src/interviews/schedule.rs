//! Interview lifecycle, coupled to the application's pipeline state.
//!
//! The coupling is a system invariant, not incidental: an interview record
//! without the matching `interview_scheduled` state (or vice versa)
//! corrupts every downstream query that joins on the field. Each operation
//! therefore validates the transition first and hands the store one atomic
//! unit of work.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::ApplicationRow;
use crate::models::interview::{InterviewKind, InterviewRow};
use crate::pipeline::states::{PipelineAction, StateChange};
use crate::store::{NewInterview, Store};

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub kind: InterviewKind,
}

async fn load_application(store: &dyn Store, id: Uuid) -> Result<ApplicationRow, AppError> {
    store
        .application(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("application {id} not found")))
}

async fn load_interview(store: &dyn Store, id: Uuid) -> Result<InterviewRow, AppError> {
    store
        .interview(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("interview {id} not found")))
}

/// Schedules an interview. Requires a shortlisted-equivalent application;
/// creating the record and advancing the state commit together.
pub async fn schedule(
    store: &dyn Store,
    application_id: Uuid,
    request: ScheduleRequest,
) -> Result<InterviewRow, AppError> {
    let app = load_application(store, application_id).await?;
    let to = app
        .pipeline_state
        .transition(PipelineAction::ScheduleInterview)?;

    let interview = store
        .schedule_interview(
            StateChange {
                from: app.pipeline_state,
                to,
            },
            NewInterview {
                application_id,
                scheduled_at: request.scheduled_at,
                duration_minutes: request.duration_minutes,
                kind: request.kind,
            },
        )
        .await?;
    Ok(interview)
}

/// Cancels an interview: the record is deleted and the application reverts
/// to `screened`, as one unit — no dangling halves.
pub async fn cancel(store: &dyn Store, interview_id: Uuid) -> Result<(), AppError> {
    let interview = load_interview(store, interview_id).await?;
    let app = load_application(store, interview.application_id).await?;
    let to = app
        .pipeline_state
        .transition(PipelineAction::CancelInterview)?;

    store
        .cancel_interview(
            interview_id,
            app.id,
            StateChange {
                from: app.pipeline_state,
                to,
            },
        )
        .await?;
    Ok(())
}

/// Marks an interview completed and advances the application.
pub async fn complete(store: &dyn Store, interview_id: Uuid) -> Result<InterviewRow, AppError> {
    let interview = load_interview(store, interview_id).await?;
    let app = load_application(store, interview.application_id).await?;
    let to = app
        .pipeline_state
        .transition(PipelineAction::CompleteInterview)?;

    store
        .complete_interview(
            interview_id,
            app.id,
            StateChange {
                from: app.pipeline_state,
                to,
            },
        )
        .await?;
    load_interview(store, interview_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::interview::InterviewStatus;
    use crate::pipeline::states::PipelineState;
    use crate::store::memory::MemoryStore;
    use crate::testutil::blank_application;

    fn request() -> ScheduleRequest {
        ScheduleRequest {
            scheduled_at: Utc::now() + chrono::Duration::days(2),
            duration_minutes: 45,
            kind: InterviewKind::Video,
        }
    }

    #[tokio::test]
    async fn test_schedule_creates_record_and_advances_state() {
        let store = MemoryStore::new();
        let app = blank_application(PipelineState::Shortlisted);
        let app_id = app.id;
        store.insert_application(app);

        let interview = schedule(&store, app_id, request()).await.unwrap();
        assert_eq!(interview.application_id, app_id);
        assert_eq!(interview.status, InterviewStatus::Upcoming);

        let advanced = store.application(app_id).await.unwrap().unwrap();
        assert_eq!(advanced.pipeline_state, PipelineState::InterviewScheduled);
    }

    #[tokio::test]
    async fn test_schedule_rejected_outside_shortlist_without_side_effects() {
        let store = MemoryStore::new();
        let app = blank_application(PipelineState::Submitted);
        let app_id = app.id;
        store.insert_application(app);

        let result = schedule(&store, app_id, request()).await;
        assert!(matches!(result, Err(AppError::Transition(_))));

        // Neither half happened.
        let untouched = store.application(app_id).await.unwrap().unwrap();
        assert_eq!(untouched.pipeline_state, PipelineState::Submitted);
        assert!(store.interviews_ordered().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_round_trip_reverts_to_screened() {
        let store = MemoryStore::new();
        let app = blank_application(PipelineState::Shortlisted);
        let app_id = app.id;
        store.insert_application(app);

        let interview = schedule(&store, app_id, request()).await.unwrap();
        cancel(&store, interview.id).await.unwrap();

        let reverted = store.application(app_id).await.unwrap().unwrap();
        assert_eq!(reverted.pipeline_state, PipelineState::Screened);
        assert!(store.interviews_ordered().await.unwrap().is_empty());

        // Screened is shortlisted-equivalent: rescheduling works.
        let rescheduled = schedule(&store, app_id, request()).await.unwrap();
        assert_eq!(rescheduled.application_id, app_id);
    }

    #[tokio::test]
    async fn test_complete_marks_both_records() {
        let store = MemoryStore::new();
        let app = blank_application(PipelineState::Shortlisted);
        let app_id = app.id;
        store.insert_application(app);

        let interview = schedule(&store, app_id, request()).await.unwrap();
        let completed = complete(&store, interview.id).await.unwrap();
        assert_eq!(completed.status, InterviewStatus::Completed);

        let advanced = store.application(app_id).await.unwrap().unwrap();
        assert_eq!(advanced.pipeline_state, PipelineState::InterviewCompleted);
    }

    #[tokio::test]
    async fn test_interviews_listed_in_time_order() {
        let store = MemoryStore::new();
        let first = blank_application(PipelineState::Shortlisted);
        let second = blank_application(PipelineState::Shortlisted);
        let first_id = first.id;
        let second_id = second.id;
        store.insert_application(first);
        store.insert_application(second);

        let later = ScheduleRequest {
            scheduled_at: Utc::now() + chrono::Duration::days(5),
            duration_minutes: 30,
            kind: InterviewKind::Onsite,
        };
        schedule(&store, second_id, later).await.unwrap();
        schedule(&store, first_id, request()).await.unwrap();

        let ordered = store.interviews_ordered().await.unwrap();
        assert_eq!(ordered.len(), 2);
        assert!(ordered[0].scheduled_at <= ordered[1].scheduled_at);
        assert_eq!(ordered[0].application_id, first_id);
    }
}
