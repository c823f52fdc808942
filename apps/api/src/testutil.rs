//! Shared fixtures for the inline test modules.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use crate::clients::{Artifact, ArtifactError, ArtifactFetcher};
use crate::models::application::ApplicationRow;
use crate::models::job::{JobRow, JobStatus};
use crate::pipeline::states::PipelineState;

pub fn blank_application(state: PipelineState) -> ApplicationRow {
    ApplicationRow {
        id: Uuid::new_v4(),
        job_id: Uuid::new_v4(),
        applicant_id: Uuid::new_v4(),
        applicant_name: "Sarah Chen".to_string(),
        applicant_email: "sarah@example.com".to_string(),
        applicant_phone: String::new(),
        resume_url: Some("https://blobs.example/resume.pdf".to_string()),
        video_url: Some("https://blobs.example/intro.mp4".to_string()),
        pipeline_state: state,
        layer1_qualified: true,
        layer1_reasons: vec![],
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
    }
}

pub fn scored_application(job_id: Uuid, name: &str, score: f64) -> ApplicationRow {
    let mut app = blank_application(PipelineState::SemanticScored);
    app.job_id = job_id;
    app.applicant_name = name.to_string();
    app.resume_url = Some(format!("https://blobs.example/{}.pdf", name.replace(' ', "-")));
    app.semantic_score = Some(score);
    app
}

pub fn active_job(title: &str) -> JobRow {
    JobRow {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: "Own the ranking pipeline end to end.".to_string(),
        status: JobStatus::Active,
        applicant_count: 0,
        max_applicants: None,
        created_at: Utc::now(),
    }
}

/// Artifact fetcher serving a fixed url → bytes map; anything else 404s.
#[derive(Default)]
pub struct StaticArtifacts {
    files: HashMap<String, Bytes>,
}

impl StaticArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: &str, bytes: &[u8]) {
        self.files.insert(url.to_string(), Bytes::copy_from_slice(bytes));
    }
}

#[async_trait]
impl ArtifactFetcher for StaticArtifacts {
    async fn fetch(&self, url: &str) -> Result<Artifact, ArtifactError> {
        self.files
            .get(url)
            .map(|bytes| Artifact {
                bytes: bytes.clone(),
                content_type: "application/pdf".to_string(),
            })
            .ok_or(ArtifactError::Status(404))
    }
}
