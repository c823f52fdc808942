//! In-memory `Store` used by tests. Mirrors the Postgres implementation's
//! guard semantics (stale-state conflicts, uniqueness, cap enforcement) so
//! orchestration tests exercise the same failure paths.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{NewApplication, NewInterview, Store, StoreError};
use crate::models::application::ApplicationRow;
use crate::models::interview::{InterviewRow, InterviewStatus};
use crate::models::job::JobRow;
use crate::pipeline::merger::LayerUpdate;
use crate::pipeline::states::{PipelineState, StateChange};

#[derive(Default)]
pub struct MemoryStore {
    jobs: Mutex<Vec<JobRow>>,
    applications: Mutex<Vec<ApplicationRow>>,
    interviews: Mutex<Vec<InterviewRow>>,
    failing_updates: Mutex<HashSet<Uuid>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_job(&self, job: JobRow) {
        self.jobs.lock().unwrap().push(job);
    }

    pub fn insert_application(&self, app: ApplicationRow) {
        self.applications.lock().unwrap().push(app);
    }

    /// Makes `apply_update` fail for the given application, simulating a
    /// persistence failure after a successful merge.
    pub fn fail_updates_for(&self, id: Uuid) {
        self.failing_updates.lock().unwrap().insert(id);
    }

    fn guard_state(
        &self,
        id: Uuid,
        change: &StateChange,
    ) -> Result<(), StoreError> {
        let mut apps = self.applications.lock().unwrap();
        let app = apps
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("application {id} not found")))?;
        if app.pipeline_state != change.from {
            return Err(StoreError::Conflict(format!(
                "application {id} is no longer in state {}",
                change.from
            )));
        }
        app.pipeline_state = change.to;
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn job(&self, id: Uuid) -> Result<Option<JobRow>, StoreError> {
        Ok(self.jobs.lock().unwrap().iter().find(|j| j.id == id).cloned())
    }

    async fn application(&self, id: Uuid) -> Result<Option<ApplicationRow>, StoreError> {
        Ok(self
            .applications
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn applications_for_job(
        &self,
        job_id: Uuid,
    ) -> Result<Vec<ApplicationRow>, StoreError> {
        Ok(self
            .applications
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn applications_for_applicant(
        &self,
        applicant_id: Uuid,
    ) -> Result<Vec<ApplicationRow>, StoreError> {
        Ok(self
            .applications
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.applicant_id == applicant_id)
            .cloned()
            .collect())
    }

    async fn applications_in_state(
        &self,
        state: PipelineState,
    ) -> Result<Vec<ApplicationRow>, StoreError> {
        Ok(self
            .applications
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.pipeline_state == state)
            .cloned()
            .collect())
    }

    async fn create_application(
        &self,
        new: NewApplication,
    ) -> Result<ApplicationRow, StoreError> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .iter_mut()
            .find(|j| j.id == new.job_id)
            .ok_or_else(|| StoreError::NotFound(format!("job {} not found", new.job_id)))?;
        if let Some(cap) = job.max_applicants {
            if job.applicant_count >= cap {
                return Err(StoreError::Conflict(
                    "position is no longer accepting applications".to_string(),
                ));
            }
        }

        let mut apps = self.applications.lock().unwrap();
        if apps
            .iter()
            .any(|a| a.applicant_id == new.applicant_id && a.job_id == new.job_id)
        {
            return Err(StoreError::Conflict(
                "an application for this job already exists".to_string(),
            ));
        }
        job.applicant_count += 1;

        let app = ApplicationRow {
            id: Uuid::new_v4(),
            job_id: new.job_id,
            applicant_id: new.applicant_id,
            applicant_name: new.applicant_name,
            applicant_email: new.applicant_email,
            applicant_phone: new.applicant_phone,
            resume_url: new.resume_url,
            video_url: new.video_url,
            pipeline_state: PipelineState::Submitted,
            layer1_qualified: new.layer1_qualified,
            layer1_reasons: new.layer1_reasons,
            semantic_score: None,
            extracted: None,
            breakdown: None,
            reasoning: None,
            semantic_rank: None,
            final_rank: None,
            video_score: None,
            video_analysis: None,
            integrity_score: None,
            portfolio_analysis: None,
            submitted_at: Utc::now(),
        };
        apps.push(app.clone());
        Ok(app)
    }

    async fn apply_update(&self, id: Uuid, update: &LayerUpdate) -> Result<(), StoreError> {
        if self.failing_updates.lock().unwrap().contains(&id) {
            // Simulated persistence failure.
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }

        let mut apps = self.applications.lock().unwrap();
        let app = apps
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("application {id} not found")))?;

        match update {
            LayerUpdate::Semantic {
                semantic_score,
                extracted,
                breakdown,
                semantic_rank,
                advance,
            } => {
                if let Some(change) = advance {
                    if app.pipeline_state != change.from {
                        return Err(StoreError::Conflict(format!(
                            "application {id} is no longer in state {}",
                            change.from
                        )));
                    }
                    app.pipeline_state = change.to;
                }
                app.semantic_score = Some(*semantic_score);
                app.extracted = extracted.clone();
                app.breakdown = breakdown.clone();
                app.semantic_rank = *semantic_rank;
            }
            LayerUpdate::Rerank {
                change,
                final_rank,
                reasoning,
            } => {
                if app.pipeline_state != change.from {
                    return Err(StoreError::Conflict(format!(
                        "application {id} is no longer in state {}",
                        change.from
                    )));
                }
                app.pipeline_state = change.to;
                app.final_rank = Some(*final_rank);
                app.reasoning = Some(reasoning.clone());
            }
            LayerUpdate::Video {
                video_score,
                video_analysis,
            } => {
                app.video_score = Some(*video_score);
                app.video_analysis = Some(video_analysis.clone());
            }
            LayerUpdate::Audit {
                integrity_score,
                portfolio_analysis,
            } => {
                app.integrity_score = Some(*integrity_score);
                app.portfolio_analysis = Some(portfolio_analysis.clone());
            }
        }
        Ok(())
    }

    async fn apply_transition(&self, id: Uuid, change: StateChange) -> Result<(), StoreError> {
        self.guard_state(id, &change)
    }

    async fn interview(&self, id: Uuid) -> Result<Option<InterviewRow>, StoreError> {
        Ok(self
            .interviews
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == id)
            .cloned())
    }

    async fn interviews_ordered(&self) -> Result<Vec<InterviewRow>, StoreError> {
        let mut all: Vec<InterviewRow> = self.interviews.lock().unwrap().clone();
        all.sort_by_key(|i| i.scheduled_at);
        Ok(all)
    }

    async fn schedule_interview(
        &self,
        change: StateChange,
        new: NewInterview,
    ) -> Result<InterviewRow, StoreError> {
        self.guard_state(new.application_id, &change)?;
        let interview = InterviewRow {
            id: Uuid::new_v4(),
            application_id: new.application_id,
            scheduled_at: new.scheduled_at,
            duration_minutes: new.duration_minutes,
            kind: new.kind,
            status: InterviewStatus::Upcoming,
            created_at: Utc::now(),
        };
        self.interviews.lock().unwrap().push(interview.clone());
        Ok(interview)
    }

    async fn cancel_interview(
        &self,
        interview_id: Uuid,
        application_id: Uuid,
        change: StateChange,
    ) -> Result<(), StoreError> {
        {
            let interviews = self.interviews.lock().unwrap();
            if !interviews.iter().any(|i| i.id == interview_id) {
                return Err(StoreError::NotFound(format!(
                    "interview {interview_id} not found"
                )));
            }
        }
        // Revert first; only delete once the state change is known good,
        // mirroring the all-or-nothing transaction.
        self.guard_state(application_id, &change)?;
        self.interviews
            .lock()
            .unwrap()
            .retain(|i| i.id != interview_id);
        Ok(())
    }

    async fn complete_interview(
        &self,
        interview_id: Uuid,
        application_id: Uuid,
        change: StateChange,
    ) -> Result<(), StoreError> {
        {
            let mut interviews = self.interviews.lock().unwrap();
            let interview = interviews
                .iter_mut()
                .find(|i| i.id == interview_id)
                .ok_or_else(|| {
                    StoreError::NotFound(format!("interview {interview_id} not found"))
                })?;
            if interview.status != InterviewStatus::Upcoming {
                return Err(StoreError::Conflict(format!(
                    "interview {interview_id} is not upcoming"
                )));
            }
            interview.status = InterviewStatus::Completed;
        }
        self.guard_state(application_id, &change)
    }
}
