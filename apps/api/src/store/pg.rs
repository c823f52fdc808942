use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{NewApplication, NewInterview, Store, StoreError};
use crate::models::application::ApplicationRow;
use crate::models::interview::{InterviewRow, InterviewStatus};
use crate::models::job::JobRow;
use crate::pipeline::merger::LayerUpdate;
use crate::pipeline::states::{PipelineState, StateChange};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}

#[async_trait]
impl Store for PgStore {
    async fn job(&self, id: Uuid) -> Result<Option<JobRow>, StoreError> {
        Ok(
            sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn application(&self, id: Uuid) -> Result<Option<ApplicationRow>, StoreError> {
        Ok(
            sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn applications_for_job(
        &self,
        job_id: Uuid,
    ) -> Result<Vec<ApplicationRow>, StoreError> {
        Ok(sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications WHERE job_id = $1 ORDER BY submitted_at ASC",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn applications_for_applicant(
        &self,
        applicant_id: Uuid,
    ) -> Result<Vec<ApplicationRow>, StoreError> {
        Ok(sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications WHERE applicant_id = $1 ORDER BY submitted_at ASC",
        )
        .bind(applicant_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn applications_in_state(
        &self,
        state: PipelineState,
    ) -> Result<Vec<ApplicationRow>, StoreError> {
        Ok(sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications WHERE pipeline_state = $1 ORDER BY submitted_at ASC",
        )
        .bind(state.as_str())
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_application(
        &self,
        new: NewApplication,
    ) -> Result<ApplicationRow, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Claim a slot first: the count bump and the cap check are one
        // statement, so two racing submissions cannot both squeeze in.
        let claimed = sqlx::query(
            r#"
            UPDATE jobs
            SET applicant_count = applicant_count + 1
            WHERE id = $1
              AND (max_applicants IS NULL OR applicant_count < max_applicants)
            "#,
        )
        .bind(new.job_id)
        .execute(&mut *tx)
        .await?;
        if claimed.rows_affected() == 0 {
            return Err(StoreError::Conflict(
                "position is no longer accepting applications".to_string(),
            ));
        }

        let id = Uuid::new_v4();
        let submitted_at = Utc::now();
        let inserted = sqlx::query(
            r#"
            INSERT INTO applications
                (id, job_id, applicant_id, applicant_name, applicant_email,
                 applicant_phone, resume_url, video_url, pipeline_state,
                 layer1_qualified, layer1_reasons, submitted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(id)
        .bind(new.job_id)
        .bind(new.applicant_id)
        .bind(&new.applicant_name)
        .bind(&new.applicant_email)
        .bind(&new.applicant_phone)
        .bind(&new.resume_url)
        .bind(&new.video_url)
        .bind(PipelineState::Submitted.as_str())
        .bind(new.layer1_qualified)
        .bind(&new.layer1_reasons)
        .bind(submitted_at)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            if is_unique_violation(&e) {
                return Err(StoreError::Conflict(
                    "an application for this job already exists".to_string(),
                ));
            }
            return Err(e.into());
        }

        tx.commit().await?;
        info!("Created application {id} for job {}", new.job_id);

        self.application(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("application {id} vanished after insert")))
    }

    async fn apply_update(&self, id: Uuid, update: &LayerUpdate) -> Result<(), StoreError> {
        let affected = match update {
            LayerUpdate::Semantic {
                semantic_score,
                extracted,
                breakdown,
                semantic_rank,
                advance: None,
            } => {
                sqlx::query(
                    r#"
                    UPDATE applications
                    SET semantic_score = $2, extracted = $3, breakdown = $4,
                        semantic_rank = $5
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .bind(semantic_score)
                .bind(extracted)
                .bind(breakdown)
                .bind(semantic_rank)
                .execute(&self.pool)
                .await?
                .rows_affected()
            }
            LayerUpdate::Semantic {
                semantic_score,
                extracted,
                breakdown,
                semantic_rank,
                advance: Some(change),
            } => {
                sqlx::query(
                    r#"
                    UPDATE applications
                    SET semantic_score = $2, extracted = $3, breakdown = $4,
                        semantic_rank = $5, pipeline_state = $6
                    WHERE id = $1 AND pipeline_state = $7
                    "#,
                )
                .bind(id)
                .bind(semantic_score)
                .bind(extracted)
                .bind(breakdown)
                .bind(semantic_rank)
                .bind(change.to.as_str())
                .bind(change.from.as_str())
                .execute(&self.pool)
                .await?
                .rows_affected()
            }
            LayerUpdate::Rerank {
                change,
                final_rank,
                reasoning,
            } => {
                sqlx::query(
                    r#"
                    UPDATE applications
                    SET pipeline_state = $2, final_rank = $3, reasoning = $4
                    WHERE id = $1 AND pipeline_state = $5
                    "#,
                )
                .bind(id)
                .bind(change.to.as_str())
                .bind(final_rank)
                .bind(reasoning)
                .bind(change.from.as_str())
                .execute(&self.pool)
                .await?
                .rows_affected()
            }
            LayerUpdate::Video {
                video_score,
                video_analysis,
            } => {
                sqlx::query(
                    r#"
                    UPDATE applications
                    SET video_score = $2, video_analysis = $3
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .bind(video_score)
                .bind(video_analysis)
                .execute(&self.pool)
                .await?
                .rows_affected()
            }
            LayerUpdate::Audit {
                integrity_score,
                portfolio_analysis,
            } => {
                sqlx::query(
                    r#"
                    UPDATE applications
                    SET integrity_score = $2, portfolio_analysis = $3
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .bind(integrity_score)
                .bind(portfolio_analysis)
                .execute(&self.pool)
                .await?
                .rows_affected()
            }
        };

        if affected == 0 {
            return Err(StoreError::Conflict(format!(
                "application {id} missing or its pipeline state changed"
            )));
        }
        Ok(())
    }

    async fn apply_transition(&self, id: Uuid, change: StateChange) -> Result<(), StoreError> {
        let affected = sqlx::query(
            "UPDATE applications SET pipeline_state = $2 WHERE id = $1 AND pipeline_state = $3",
        )
        .bind(id)
        .bind(change.to.as_str())
        .bind(change.from.as_str())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(StoreError::Conflict(format!(
                "application {id} is no longer in state {}",
                change.from
            )));
        }
        Ok(())
    }

    async fn interview(&self, id: Uuid) -> Result<Option<InterviewRow>, StoreError> {
        Ok(
            sqlx::query_as::<_, InterviewRow>("SELECT * FROM interviews WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn interviews_ordered(&self) -> Result<Vec<InterviewRow>, StoreError> {
        Ok(sqlx::query_as::<_, InterviewRow>(
            "SELECT * FROM interviews ORDER BY scheduled_at ASC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn schedule_interview(
        &self,
        change: StateChange,
        new: NewInterview,
    ) -> Result<InterviewRow, StoreError> {
        let mut tx = self.pool.begin().await?;

        let advanced = sqlx::query(
            "UPDATE applications SET pipeline_state = $2 WHERE id = $1 AND pipeline_state = $3",
        )
        .bind(new.application_id)
        .bind(change.to.as_str())
        .bind(change.from.as_str())
        .execute(&mut *tx)
        .await?;
        if advanced.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!(
                "application {} is no longer in state {}",
                new.application_id, change.from
            )));
        }

        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO interviews
                (id, application_id, scheduled_at, duration_minutes, kind, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(new.application_id)
        .bind(new.scheduled_at)
        .bind(new.duration_minutes)
        .bind(new.kind.as_str())
        .bind(InterviewStatus::Upcoming.as_str())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(
            "Scheduled interview {id} for application {}",
            new.application_id
        );

        self.interview(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("interview {id} vanished after insert")))
    }

    async fn cancel_interview(
        &self,
        interview_id: Uuid,
        application_id: Uuid,
        change: StateChange,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM interviews WHERE id = $1")
            .bind(interview_id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "interview {interview_id} not found"
            )));
        }

        let reverted = sqlx::query(
            "UPDATE applications SET pipeline_state = $2 WHERE id = $1 AND pipeline_state = $3",
        )
        .bind(application_id)
        .bind(change.to.as_str())
        .bind(change.from.as_str())
        .execute(&mut *tx)
        .await?;
        if reverted.rows_affected() == 0 {
            // Dropping the transaction rolls the delete back too.
            return Err(StoreError::Conflict(format!(
                "application {application_id} is no longer in state {}",
                change.from
            )));
        }

        tx.commit().await?;
        info!("Cancelled interview {interview_id}, application {application_id} reverted");
        Ok(())
    }

    async fn complete_interview(
        &self,
        interview_id: Uuid,
        application_id: Uuid,
        change: StateChange,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let marked = sqlx::query("UPDATE interviews SET status = $2 WHERE id = $1 AND status = $3")
            .bind(interview_id)
            .bind(InterviewStatus::Completed.as_str())
            .bind(InterviewStatus::Upcoming.as_str())
            .execute(&mut *tx)
            .await?;
        if marked.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!(
                "interview {interview_id} is not upcoming"
            )));
        }

        let advanced = sqlx::query(
            "UPDATE applications SET pipeline_state = $2 WHERE id = $1 AND pipeline_state = $3",
        )
        .bind(application_id)
        .bind(change.to.as_str())
        .bind(change.from.as_str())
        .execute(&mut *tx)
        .await?;
        if advanced.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!(
                "application {application_id} is no longer in state {}",
                change.from
            )));
        }

        tx.commit().await?;
        Ok(())
    }
}
