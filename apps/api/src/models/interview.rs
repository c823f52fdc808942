use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewKind {
    Video,
    Onsite,
}

impl InterviewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewKind::Video => "video",
            InterviewKind::Onsite => "onsite",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    Upcoming,
    Completed,
    Cancelled,
}

impl InterviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStatus::Upcoming => "upcoming",
            InterviewStatus::Completed => "completed",
            InterviewStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown interview field value '{0}'")]
pub struct UnknownInterviewValue(String);

impl TryFrom<String> for InterviewKind {
    type Error = UnknownInterviewValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "video" => Ok(InterviewKind::Video),
            "onsite" => Ok(InterviewKind::Onsite),
            _ => Err(UnknownInterviewValue(value)),
        }
    }
}

impl TryFrom<String> for InterviewStatus {
    type Error = UnknownInterviewValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "upcoming" => Ok(InterviewStatus::Upcoming),
            "completed" => Ok(InterviewStatus::Completed),
            "cancelled" => Ok(InterviewStatus::Cancelled),
            _ => Err(UnknownInterviewValue(value)),
        }
    }
}

/// One scheduled interview. Creation and deletion are coupled to the linked
/// application's pipeline state — see `interviews::schedule`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewRow {
    pub id: Uuid,
    pub application_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    #[sqlx(try_from = "String")]
    pub kind: InterviewKind,
    #[sqlx(try_from = "String")]
    pub status: InterviewStatus,
    pub created_at: DateTime<Utc>,
}
