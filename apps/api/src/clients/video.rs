//! Client for the video behavioral-analysis service.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::{read_json, ClientError};

/// Envelope returned by `POST /analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoAnalysisResponse {
    pub status: String,
    #[serde(default)]
    pub filename: Option<String>,
    pub data: VideoAnalysisData,
}

/// The analysis payload. `score` arrives on whatever scale the service is
/// in the mood for; the merger normalizes it. Fields the service adds later
/// survive in `extra` so merging never discards data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoAnalysisData {
    pub score: f64,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub liveness_status: Option<String>,
    #[serde(default)]
    pub speaking_rate: Option<f64>,
    #[serde(default)]
    pub eye_contact_score: Option<f64>,
    #[serde(default)]
    pub filler_count: Option<i64>,
    #[serde(default)]
    pub blink_rate_bpm: Option<f64>,
    #[serde(default)]
    pub smile_percentage: Option<f64>,
    #[serde(default)]
    pub stress_percentage: Option<f64>,
    #[serde(default)]
    pub head_stability: Option<f64>,
    /// Structured substance sub-scores (structure, relevance, conciseness).
    #[serde(default)]
    pub substance_details: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[async_trait]
pub trait VideoAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        filename: &str,
        bytes: Bytes,
    ) -> Result<VideoAnalysisResponse, ClientError>;
}

pub struct HttpVideoAnalyzer {
    client: reqwest::Client,
    base_url: String,
}

impl HttpVideoAnalyzer {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl VideoAnalyzer for HttpVideoAnalyzer {
    async fn analyze(
        &self,
        filename: &str,
        bytes: Bytes,
    ) -> Result<VideoAnalysisResponse, ClientError> {
        debug!("Submitting {filename} for video analysis");
        let part = reqwest::multipart::Part::bytes(bytes.to_vec())
            .file_name(filename.to_string())
            .mime_str("video/mp4")
            .expect("static mime type is valid");
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .client
            .post(format!("{}/analyze", self.base_url))
            .multipart(form)
            .send()
            .await?;
        read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_payload_decodes_with_unknown_fields() {
        let body = r#"{
            "status": "success",
            "filename": "interview_video.mp4",
            "data": {
                "score": 74,
                "transcript": "Hi, I'm Sarah...",
                "liveness_status": "live",
                "speaking_rate": 142.0,
                "eye_contact_score": 81.5,
                "filler_count": 4,
                "substance_details": {"structure_score": 7, "relevance_score": 8, "conciseness_score": 6},
                "avg_pause_ms": 420
            }
        }"#;
        let parsed: VideoAnalysisResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data.score, 74.0);
        assert_eq!(parsed.data.filler_count, Some(4));
        // Unknown fields are preserved, not dropped.
        assert_eq!(parsed.data.extra.get("avg_pause_ms"), Some(&Value::from(420)));
    }
}
