//! The candidate record merger.
//!
//! Takes one raw result from an external service plus the current
//! application and produces a typed partial update naming exactly the layer
//! sub-fields that change. Nothing here overwrites a whole layer: a video
//! merge cannot clobber portfolio fields and vice versa, which is what
//! makes partial enrichment safe everywhere.
//!
//! The normalization rules live here because the upstream contracts are
//! inconsistent — durations arrive as numbers or strings, confidences on
//! two different scales — and every caller must resolve them identically.

use serde_json::{json, Value};
use thiserror::Error;

use crate::clients::{AuditReport, RerankResult, ScoreResult, VideoAnalysisResponse};
use crate::models::application::ApplicationRow;
use crate::pipeline::states::{StateChange, TransitionError};

/// Rank assigned when the service omits one: worse than any real rank, so
/// unranked candidates sort after ranked ones.
pub const UNRANKED_SENTINEL: i32 = 999;

#[derive(Debug, Error)]
pub enum MergeError {
    /// The service echoed a per-file failure instead of a score.
    #[error("upstream failed on {filename}: {message}")]
    Upstream { filename: String, message: String },

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// A partial update to an application's layer fields. Each variant maps to
/// one static UPDATE in the store touching only the named columns.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerUpdate {
    Semantic {
        semantic_score: f64,
        extracted: Option<Value>,
        breakdown: Option<Value>,
        /// Batch position by score, assigned by the orchestrator once the
        /// whole batch has merged; `None` until then.
        semantic_rank: Option<i32>,
        /// Present when the scoring pass also advances the pipeline state;
        /// applied in the same statement as the score.
        advance: Option<StateChange>,
    },
    Rerank {
        change: StateChange,
        final_rank: i32,
        reasoning: String,
    },
    Video {
        video_score: f64,
        video_analysis: Value,
    },
    Audit {
        integrity_score: f64,
        portfolio_analysis: Value,
    },
}

/// Coerces a duration that may arrive as a number or a string of one.
/// Unparsable values are 0, not an error — one garbled entry must not sink
/// the whole merge.
pub fn coerce_duration(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Normalizes a confidence that may arrive on the unit scale or as a
/// percentage, into the stored [0,1] form.
///
/// The scale is inferred: a value strictly below 1.0 can only be a unit
/// fraction and is kept; 1.0 and above is read as a percentage and divided
/// by 100. The boundary is deliberate — a raw 1 means 1%, not 100%. This
/// inference is a compatibility shim for upstream services that do not
/// declare their scale; clients gaining an explicit scale field should
/// bypass it.
pub fn normalize_confidence(raw: f64) -> f64 {
    if raw < 1.0 {
        raw.max(0.0)
    } else {
        (raw / 100.0).min(1.0)
    }
}

/// Folds a scoring-engine result into a layer-2 update. The stored score
/// lands on the whole-percent grid the way the original pipeline recorded
/// it. Also computes the state advance for applications not yet scored —
/// states never move backward, so re-scoring a shortlisted candidate only
/// refreshes the numbers.
pub fn merge_semantic(
    result: &ScoreResult,
    current: &ApplicationRow,
) -> Result<LayerUpdate, MergeError> {
    let raw = result.rank_score.ok_or_else(|| MergeError::Upstream {
        filename: result.filename.clone(),
        message: result
            .error
            .clone()
            .unwrap_or_else(|| "no score returned".to_string()),
    })?;
    let semantic_score = (normalize_confidence(raw) * 100.0).round() / 100.0;

    let advance = current
        .pipeline_state
        .scoring_target()?
        .map(|to| StateChange {
            from: current.pipeline_state,
            to,
        });

    Ok(LayerUpdate::Semantic {
        semantic_score,
        extracted: result.extracted_data.as_ref().map(sanitize_extracted),
        breakdown: result.breakdown.clone(),
        semantic_rank: None,
        advance,
    })
}

/// Folds a rerank verdict into state + rank + reasoning, validated against
/// the current state so the write stays all-or-nothing.
pub fn merge_rerank(
    result: &RerankResult,
    current: &ApplicationRow,
) -> Result<LayerUpdate, MergeError> {
    let to = current.pipeline_state.rerank_outcome(result.qualified())?;
    Ok(LayerUpdate::Rerank {
        change: StateChange {
            from: current.pipeline_state,
            to,
        },
        final_rank: result.final_rank.unwrap_or(UNRANKED_SENTINEL),
        reasoning: result.logic_reason.clone().unwrap_or_default(),
    })
}

/// Folds a video analysis into the layer-3 video fields. The portfolio
/// fields are untouched — the enrichment track is orthogonal per field.
pub fn merge_video(response: &VideoAnalysisResponse) -> LayerUpdate {
    LayerUpdate::Video {
        video_score: normalize_confidence(response.data.score),
        video_analysis: serde_json::to_value(&response.data)
            .unwrap_or_else(|_| json!({ "score": response.data.score })),
    }
}

/// Folds an audit report into the layer-3 portfolio fields.
pub fn merge_audit(report: &AuditReport) -> LayerUpdate {
    LayerUpdate::Audit {
        integrity_score: normalize_confidence(report.summary.resume_verification_score),
        portfolio_analysis: serde_json::to_value(report)
            .unwrap_or_else(|_| json!({ "summary": {}, "results": [] })),
    }
}

/// Rebuilds the extraction with experience entries pinned to the
/// {title, duration, focus} shape downstream consumers expect: title falls
/// back to "Unknown Role", durations are coerced to numbers, and `focus`
/// falls back to `description` then to "".
fn sanitize_extracted(extracted: &Value) -> Value {
    let mut out = extracted.clone();
    let experience = extracted
        .get("experience")
        .and_then(|e| e.as_array())
        .map(|entries| {
            entries
                .iter()
                .map(|entry| {
                    let duration = entry.get("duration").map(coerce_duration).unwrap_or(0.0);
                    json!({
                        "title": entry.get("title").and_then(|t| t.as_str()).unwrap_or("Unknown Role"),
                        "duration": duration,
                        "focus": entry
                            .get("focus")
                            .and_then(|f| f.as_str())
                            .filter(|f| !f.is_empty())
                            .or_else(|| entry.get("description").and_then(|d| d.as_str()))
                            .unwrap_or(""),
                    })
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    if let Some(obj) = out.as_object_mut() {
        obj.insert("experience".to_string(), Value::Array(experience));
    }
    out
}
