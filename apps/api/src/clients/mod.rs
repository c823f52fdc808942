//! Clients for the external analysis services and the blob store.
//!
//! Each collaborator sits behind a trait carried in `AppState` as an
//! `Arc<dyn ...>` so tests can substitute stubs. The HTTP implementations
//! share one `reqwest::Client`. None of them retries: every failure is
//! surfaced to the invoking operator (batch passes count per-item failures,
//! single-candidate flows report one reason).

use bytes::Bytes;
use thiserror::Error;

pub mod artifacts;
pub mod audit;
pub mod scoring;
pub mod video;

pub use artifacts::{Artifact, ArtifactError, ArtifactFetcher, HttpArtifactFetcher};
pub use audit::{AuditReport, AuditRequest, HttpPortfolioAuditor, PortfolioAuditor};
pub use scoring::{HttpScoringEngine, RerankResult, ResumeFile, ScoreResult, ScoringEngine};
pub use video::{HttpVideoAnalyzer, VideoAnalyzer, VideoAnalysisResponse};

/// Failure reported by an external scoring/analysis service.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// Shared HTTP client with the timeout the analysis services need (video
/// processing regularly takes tens of seconds).
pub fn build_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()
        .expect("Failed to build HTTP client")
}

/// Reads a response body as JSON, folding non-success statuses and decode
/// failures into `ClientError`.
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ClientError::Status {
            status: status.as_u16(),
            message,
        });
    }
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ClientError::MalformedPayload(e.to_string()))
}

/// Multipart file part for a resume upload.
pub(crate) fn pdf_part(filename: &str, bytes: Bytes) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(bytes.to_vec())
        .file_name(filename.to_string())
        .mime_str("application/pdf")
        .expect("static mime type is valid")
}
