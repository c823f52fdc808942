use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::pipeline::merger::{coerce_duration, UNRANKED_SENTINEL};
use crate::pipeline::states::PipelineState;

/// One applicant's submission against one job. Unique per
/// (applicant_id, job_id); created once, mutated in place, never deleted by
/// normal flow.
///
/// Scores are stored normalized to [0,1]. The percent accessors below are a
/// presentation transform and are never what gets persisted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub applicant_name: String,
    pub applicant_email: String,
    pub applicant_phone: String,
    pub resume_url: Option<String>,
    pub video_url: Option<String>,
    #[sqlx(try_from = "String")]
    pub pipeline_state: PipelineState,
    // Layer 1: qualification gate, produced once at submission.
    pub layer1_qualified: bool,
    pub layer1_reasons: Vec<String>,
    // Layer 2: semantic-match results.
    pub semantic_score: Option<f64>,
    pub extracted: Option<Value>,
    pub breakdown: Option<Value>,
    pub reasoning: Option<String>,
    pub semantic_rank: Option<i32>,
    pub final_rank: Option<i32>,
    // Layer 3: enrichment, each field populated independently.
    pub video_score: Option<f64>,
    pub video_analysis: Option<Value>,
    pub integrity_score: Option<f64>,
    pub portfolio_analysis: Option<Value>,
    pub submitted_at: DateTime<Utc>,
}

impl ApplicationRow {
    /// Stored [0,1] score as a UI percentage.
    pub fn match_percent(&self) -> i32 {
        self.semantic_score
            .map(|s| (s * 100.0).round() as i32)
            .unwrap_or(0)
    }

    /// Skill-similarity sub-score as a percentage. Falls back to the
    /// top-level semantic score when the breakdown is missing — never to
    /// zero, so a candidate without a fine-grained breakdown still shows a
    /// coherent match percentage.
    pub fn skill_similarity_percent(&self) -> i32 {
        self.breakdown_fraction("skill_similarity")
            .map(|f| (f * 100.0).round() as i32)
            .unwrap_or_else(|| self.match_percent())
    }

    /// Description-focus sub-score as a percentage, same fallback rule.
    pub fn description_focus_percent(&self) -> i32 {
        self.breakdown_fraction("description_focus_similarity")
            .map(|f| (f * 100.0).round() as i32)
            .unwrap_or_else(|| self.match_percent())
    }

    fn breakdown_fraction(&self, key: &str) -> Option<f64> {
        self.breakdown
            .as_ref()?
            .get("semantic")?
            .get(key)?
            .as_f64()
    }

    /// Total years of experience summed from the extracted entries.
    /// Durations arrive in inconsistent shapes; unparsable entries count 0.
    pub fn experience_years(&self) -> f64 {
        self.extracted
            .as_ref()
            .and_then(|e| e.get("experience"))
            .and_then(|e| e.as_array())
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| entry.get("duration").map(coerce_duration).unwrap_or(0.0))
                    .sum()
            })
            .unwrap_or(0.0)
    }

    /// Rank for sorting: unranked applications sort after every ranked one.
    pub fn effective_rank(&self) -> i32 {
        self.final_rank.unwrap_or(UNRANKED_SENTINEL)
    }

    pub fn video_analyzed(&self) -> bool {
        self.video_score.is_some()
    }

    pub fn portfolio_analyzed(&self) -> bool {
        self.portfolio_analysis.is_some()
    }

    pub fn summary(&self) -> CandidateSummary {
        CandidateSummary {
            id: self.id,
            job_id: self.job_id,
            applicant_name: self.applicant_name.clone(),
            pipeline_state: self.pipeline_state,
            match_percent: self.match_percent(),
            skill_similarity_percent: self.skill_similarity_percent(),
            description_focus_percent: self.description_focus_percent(),
            experience_years: self.experience_years(),
            semantic_rank: self.semantic_rank,
            final_rank: self.final_rank,
            video_analyzed: self.video_analyzed(),
            portfolio_analyzed: self.portfolio_analyzed(),
            submitted_at: self.submitted_at,
        }
    }
}

/// Cohort-view projection of an application, percentages precomputed.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateSummary {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_name: String,
    pub pipeline_state: PipelineState,
    pub match_percent: i32,
    pub skill_similarity_percent: i32,
    pub description_focus_percent: i32,
    pub experience_years: f64,
    pub semantic_rank: Option<i32>,
    pub final_rank: Option<i32>,
    pub video_analyzed: bool,
    pub portfolio_analyzed: bool,
    pub submitted_at: DateTime<Utc>,
}
