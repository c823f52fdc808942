use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    Active,
}

#[derive(Debug, Error)]
#[error("unknown job status '{0}'")]
pub struct UnknownJobStatus(String);

impl TryFrom<String> for JobStatus {
    type Error = UnknownJobStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "draft" => Ok(JobStatus::Draft),
            "active" => Ok(JobStatus::Active),
            _ => Err(UnknownJobStatus(value)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[sqlx(try_from = "String")]
    pub status: JobStatus,
    pub applicant_count: i32,
    pub max_applicants: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Immutable scoring context snapshotted from a job for the duration of a
/// batch pass. The title/description concatenation is the match target the
/// scoring engine ranks resumes against.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    pub title: String,
    pub description: String,
}

impl ScoringContext {
    pub fn from_job(job: &JobRow) -> Self {
        ScoringContext {
            title: job.title.clone(),
            description: job.description.clone(),
        }
    }

    pub fn match_target(&self) -> String {
        format!("Title: {} Description: {}", self.title, self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_target_format() {
        let ctx = ScoringContext {
            title: "AI Engineer".to_string(),
            description: "Build ranking pipelines.".to_string(),
        };
        assert_eq!(
            ctx.match_target(),
            "Title: AI Engineer Description: Build ranking pipelines."
        );
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!(JobStatus::try_from("archived".to_string()).is_err());
        assert_eq!(
            JobStatus::try_from("active".to_string()).unwrap(),
            JobStatus::Active
        );
    }
}
