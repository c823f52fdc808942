//! The pipeline state machine.
//!
//! `PipelineState` is the single source of truth for where an application
//! sits. The set of states and the transition table are closed: unknown
//! strings are rejected when a row is decoded, and illegal transitions come
//! back as a typed error, never a silent clamp.
//!
//! Video and portfolio enrichment are deliberately NOT states — they are
//! orthogonal flags carried by the layer-3 fields.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stage of an application in the hiring workflow.
///
/// Resume track: `submitted → filtered → semantic_scored → llm_ranked`.
/// Hiring track: `shortlisted → interview_scheduled → interview_completed →
/// offer_sent → {hired | offer_declined}`. `rejected` is reachable from any
/// non-terminal state; `screened` is where a cancelled interview lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Submitted,
    Filtered,
    SemanticScored,
    LlmRanked,
    Screened,
    Shortlisted,
    InterviewScheduled,
    InterviewCompleted,
    OfferSent,
    Hired,
    OfferDeclined,
    Rejected,
}

/// Requested action against an application's pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineAction {
    Filter,
    ScoreSemantic,
    RankLlm,
    Shortlist,
    ScheduleInterview,
    CancelInterview,
    CompleteInterview,
    SendOffer,
    Hire,
    DeclineOffer,
    Reject,
}

/// A validated (from, to) pair, carried by updates that move the pipeline
/// state together with other fields. The store applies it with an
/// optimistic `WHERE pipeline_state = from` guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub from: PipelineState,
    pub to: PipelineState,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("action {action:?} is not legal from state {from}")]
    Illegal {
        from: PipelineState,
        action: PipelineAction,
    },

    #[error("unknown pipeline state '{0}'")]
    UnknownState(String),
}

/// Every state, for exhaustive checks.
pub const ALL_STATES: [PipelineState; 12] = [
    PipelineState::Submitted,
    PipelineState::Filtered,
    PipelineState::SemanticScored,
    PipelineState::LlmRanked,
    PipelineState::Screened,
    PipelineState::Shortlisted,
    PipelineState::InterviewScheduled,
    PipelineState::InterviewCompleted,
    PipelineState::OfferSent,
    PipelineState::Hired,
    PipelineState::OfferDeclined,
    PipelineState::Rejected,
];

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Submitted => "submitted",
            PipelineState::Filtered => "filtered",
            PipelineState::SemanticScored => "semantic_scored",
            PipelineState::LlmRanked => "llm_ranked",
            PipelineState::Screened => "screened",
            PipelineState::Shortlisted => "shortlisted",
            PipelineState::InterviewScheduled => "interview_scheduled",
            PipelineState::InterviewCompleted => "interview_completed",
            PipelineState::OfferSent => "offer_sent",
            PipelineState::Hired => "hired",
            PipelineState::OfferDeclined => "offer_declined",
            PipelineState::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Hired | PipelineState::Rejected | PipelineState::OfferDeclined
        )
    }

    /// Validates and applies one action. Pure function of (state, action);
    /// the stored state is untouched when the pair is illegal.
    pub fn transition(self, action: PipelineAction) -> Result<PipelineState, TransitionError> {
        use PipelineAction::*;
        use PipelineState::*;

        // Rejection is legal from every non-terminal state.
        if action == Reject {
            return if self.is_terminal() {
                Err(TransitionError::Illegal {
                    from: self,
                    action,
                })
            } else {
                Ok(Rejected)
            };
        }

        match (self, action) {
            (Submitted, Filter) => Ok(Filtered),
            (Filtered, ScoreSemantic) => Ok(SemanticScored),
            (SemanticScored, RankLlm) => Ok(LlmRanked),
            (LlmRanked, Shortlist) => Ok(Shortlisted),
            // Screened is shortlisted-equivalent: a cancelled interview
            // returns there and must be reschedulable.
            (Shortlisted | Screened, ScheduleInterview) => Ok(InterviewScheduled),
            (InterviewScheduled, CancelInterview) => Ok(Screened),
            (InterviewScheduled, CompleteInterview) => Ok(InterviewCompleted),
            (InterviewCompleted, SendOffer) => Ok(OfferSent),
            (OfferSent, Hire) => Ok(Hired),
            (OfferSent, DeclineOffer) => Ok(OfferDeclined),
            (from, action) => Err(TransitionError::Illegal { from, action }),
        }
    }

    /// Outcome of the reranking pass for one candidate: the llm-ranking hop
    /// composed with the external verdict, validated link by link so no
    /// state is skipped. `qualified` maps to `shortlisted`, anything else
    /// to `rejected`.
    pub fn rerank_outcome(self, qualified: bool) -> Result<PipelineState, TransitionError> {
        let ranked = self.transition(PipelineAction::RankLlm)?;
        if qualified {
            ranked.transition(PipelineAction::Shortlist)
        } else {
            ranked.transition(PipelineAction::Reject)
        }
    }

    /// Where the scoring pass leaves this application. Early states advance
    /// hop by hop to `semantic_scored`; anything at or beyond it keeps its
    /// state (scores still refresh, states never move backward).
    pub fn scoring_target(self) -> Result<Option<PipelineState>, TransitionError> {
        match self {
            PipelineState::Submitted => {
                let filtered = self.transition(PipelineAction::Filter)?;
                Ok(Some(filtered.transition(PipelineAction::ScoreSemantic)?))
            }
            PipelineState::Filtered => Ok(Some(self.transition(PipelineAction::ScoreSemantic)?)),
            _ => Ok(None),
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row-decoding boundary: unknown stored states are an error, not a default.
impl TryFrom<String> for PipelineState {
    type Error = TransitionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ALL_STATES
            .iter()
            .find(|s| s.as_str() == value)
            .copied()
            .ok_or(TransitionError::UnknownState(value))
    }
}
