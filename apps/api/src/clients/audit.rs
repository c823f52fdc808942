//! Client for the portfolio audit service.
//!
//! Unlike the other services this one takes structured JSON, built from the
//! resume extraction a prior scoring pass produced. The request shape is
//! strict on the service side, so the builder pins every field and supplies
//! defaults rather than forwarding the extraction verbatim.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{read_json, ClientError};
use crate::pipeline::merger::coerce_duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditProject {
    pub title: String,
    pub description: String,
    pub tech_stack: Vec<String>,
    pub live_link: Option<String>,
    pub repo_link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditExperience {
    pub title: String,
    pub duration: f64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEducation {
    pub degree: String,
    pub course: String,
    pub year: String,
}

/// Request body for `POST /audit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRequest {
    pub summary: String,
    pub skills: Vec<String>,
    pub portfolio_url: String,
    pub projects: Vec<AuditProject>,
    pub experience: Vec<AuditExperience>,
    pub education: Vec<AuditEducation>,
    pub certifications: Vec<Value>,
}

impl AuditRequest {
    /// Builds the audit payload from a stored resume extraction. Durations
    /// are coerced to numbers, experience `focus` maps to the service's
    /// `description` field, and the service requires `certifications` to be
    /// present even when empty.
    pub fn from_extracted(extracted: &Value) -> AuditRequest {
        AuditRequest {
            summary: str_field(extracted, "summary"),
            skills: string_array(extracted.get("skills")),
            portfolio_url: str_field(extracted, "portfolio_url"),
            projects: array(extracted.get("projects"))
                .iter()
                .map(|p| AuditProject {
                    title: p
                        .get("title")
                        .and_then(|v| v.as_str())
                        .unwrap_or("Untitled Project")
                        .to_string(),
                    description: str_field(p, "description"),
                    tech_stack: string_array(p.get("tech_stack")),
                    live_link: opt_str(p, "live_link"),
                    repo_link: opt_str(p, "repo_link"),
                })
                .collect(),
            experience: array(extracted.get("experience"))
                .iter()
                .map(|e| AuditExperience {
                    title: str_field(e, "title"),
                    duration: e.get("duration").map(coerce_duration).unwrap_or(0.0),
                    description: match opt_str(e, "focus") {
                        Some(focus) => focus,
                        None => str_field(e, "description"),
                    },
                })
                .collect(),
            education: array(extracted.get("education"))
                .iter()
                .map(|e| AuditEducation {
                    degree: str_field(e, "degree"),
                    course: str_field(e, "course"),
                    year: str_field(e, "year"),
                })
                .collect(),
            certifications: vec![],
        }
    }
}

fn array(v: Option<&Value>) -> Vec<Value> {
    v.and_then(|v| v.as_array()).cloned().unwrap_or_default()
}

fn string_array(v: Option<&Value>) -> Vec<String> {
    array(v)
        .iter()
        .filter_map(|s| s.as_str().map(String::from))
        .collect()
}

fn str_field(v: &Value, key: &str) -> String {
    v.get(key)
        .and_then(|s| s.as_str())
        .unwrap_or_default()
        .to_string()
}

fn opt_str(v: &Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(|s| s.as_str())
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Aggregate scores in the audit report. `resume_verification_score` is a
/// percentage; the merger normalizes it into the stored integrity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSummary {
    #[serde(default)]
    pub github_code_quality: f64,
    #[serde(default)]
    pub portfolio_product_score: f64,
    #[serde(default)]
    pub resume_verification_score: f64,
}

/// Full report from `POST /audit`. Per-project entries stay raw JSON: the
/// service mixes types inside them (a code-quality score may be a number or
/// the string "N/A") and the record merger stores them as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub summary: AuditSummary,
    #[serde(default)]
    pub results: Vec<Value>,
}

#[async_trait]
pub trait PortfolioAuditor: Send + Sync {
    async fn audit(&self, request: &AuditRequest) -> Result<AuditReport, ClientError>;
}

pub struct HttpPortfolioAuditor {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPortfolioAuditor {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl PortfolioAuditor for HttpPortfolioAuditor {
    async fn audit(&self, request: &AuditRequest) -> Result<AuditReport, ClientError> {
        debug!(
            "Submitting portfolio audit for {} projects",
            request.projects.len()
        );
        let response = self
            .client
            .post(format!("{}/audit", self.base_url))
            .json(request)
            .send()
            .await?;
        read_json(response).await
    }
}
