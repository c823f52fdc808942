//! Client for the resume scoring / reranking service.
//!
//! Both endpoints take one multipart request: the job match target as a
//! `job_description` field plus the cohort's resumes as `files` parts. The
//! filename of each part is the composite key
//! `"{applicationId}__{sanitizedName}_Resume.pdf"` that joins results back
//! to applications.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{pdf_part, read_json, ClientError};

/// One resume queued for a batch request.
#[derive(Debug, Clone)]
pub struct ResumeFile {
    pub filename: String,
    pub bytes: Bytes,
}

/// Per-resume result from `POST /score-candidates/`.
///
/// `rank_score` is absent when the service failed on that file (it echoes
/// an `error` entry instead); callers count those as per-item failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    pub filename: String,
    #[serde(default)]
    pub rank_score: Option<f64>,
    #[serde(default)]
    pub extracted_data: Option<Value>,
    #[serde(default)]
    pub breakdown: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Per-resume result from `POST /rerank-candidates/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankResult {
    pub filename: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub final_rank: Option<i32>,
    #[serde(default)]
    pub logic_reason: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl RerankResult {
    /// The verdict that drives `shortlisted` vs `rejected`.
    pub fn qualified(&self) -> bool {
        self.status.as_deref() == Some("QUALIFIED")
    }
}

#[async_trait]
pub trait ScoringEngine: Send + Sync {
    async fn score_batch(
        &self,
        job_description: &str,
        files: &[ResumeFile],
    ) -> Result<Vec<ScoreResult>, ClientError>;

    async fn rerank_batch(
        &self,
        job_description: &str,
        files: &[ResumeFile],
    ) -> Result<Vec<RerankResult>, ClientError>;
}

pub struct HttpScoringEngine {
    client: reqwest::Client,
    base_url: String,
}

impl HttpScoringEngine {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    fn form(job_description: &str, files: &[ResumeFile]) -> reqwest::multipart::Form {
        let mut form =
            reqwest::multipart::Form::new().text("job_description", job_description.to_string());
        for file in files {
            form = form.part("files", pdf_part(&file.filename, file.bytes.clone()));
        }
        form
    }
}

#[async_trait]
impl ScoringEngine for HttpScoringEngine {
    async fn score_batch(
        &self,
        job_description: &str,
        files: &[ResumeFile],
    ) -> Result<Vec<ScoreResult>, ClientError> {
        debug!("Scoring batch of {} resumes", files.len());
        let response = self
            .client
            .post(format!("{}/score-candidates/", self.base_url))
            .multipart(Self::form(job_description, files))
            .send()
            .await?;
        read_json(response).await
    }

    async fn rerank_batch(
        &self,
        job_description: &str,
        files: &[ResumeFile],
    ) -> Result<Vec<RerankResult>, ClientError> {
        debug!("Reranking batch of {} resumes", files.len());
        let response = self
            .client
            .post(format!("{}/rerank-candidates/", self.base_url))
            .multipart(Self::form(job_description, files))
            .send()
            .await?;
        read_json(response).await
    }
}
