//! Batch passes over one job's cohort.
//!
//! Both passes follow the same outline: take the per-job lease, collect the
//! cohort's resumes, make one batch request to the scoring engine, join
//! results back by the composite filename key and persist each merged
//! update independently. One bad artifact or one failing persist never
//! aborts the batch; a transport failure from the scoring engine does, but
//! leaves already-merged prior results untouched. Nothing retries
//! automatically — the report tells the operator what happened and a
//! re-run is a manual action.

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clients::{ArtifactFetcher, ResumeFile, ScoringEngine};
use crate::errors::AppError;
use crate::models::application::ApplicationRow;
use crate::models::job::ScoringContext;
use crate::pipeline::lease::PassLeases;
use crate::pipeline::merger::{merge_rerank, merge_semantic, LayerUpdate, MergeError};
use crate::store::Store;

/// Rerank cohort cap: the expensive second pass only ever sees the top 8.
pub const RERANK_COHORT_CAP: usize = 8;

/// How many failure reasons a report carries verbatim; the counts stay
/// exact regardless.
const FAILURE_SAMPLE: usize = 5;

#[derive(Debug, Serialize)]
pub struct PassFailure {
    pub application_id: Option<Uuid>,
    pub reason: String,
}

/// Outcome of one batch pass, reported to the invoking operator.
#[derive(Debug, Serialize)]
pub struct PassReport {
    pub job_id: Uuid,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<PassFailure>,
}

impl PassReport {
    fn new(job_id: Uuid) -> Self {
        PassReport {
            job_id,
            succeeded: 0,
            failed: 0,
            failures: Vec::new(),
        }
    }

    fn record_failure(&mut self, application_id: Option<Uuid>, reason: String) {
        warn!("Pass failure for {application_id:?}: {reason}");
        self.failed += 1;
        if self.failures.len() < FAILURE_SAMPLE {
            self.failures.push(PassFailure {
                application_id,
                reason,
            });
        }
    }
}

/// Composite key joining a scoring result back to its application: the
/// segment before `__` is the application id.
pub fn resume_filename(app: &ApplicationRow) -> String {
    let sanitized = app
        .applicant_name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    format!("{}__{}_Resume.pdf", app.id, sanitized)
}

pub fn parse_application_id(filename: &str) -> Option<Uuid> {
    let (id, _) = filename.split_once("__")?;
    Uuid::parse_str(id).ok()
}

/// Cohort view after a scoring pass: best match first.
pub fn sort_by_score_desc(cohort: &mut [ApplicationRow]) {
    cohort.sort_by(|a, b| {
        b.semantic_score
            .unwrap_or(0.0)
            .total_cmp(&a.semantic_score.unwrap_or(0.0))
    });
}

/// Cohort view after a rerank pass: rank ascending (unranked last via the
/// sentinel), score descending as tie-break.
pub fn sort_by_rank_then_score(cohort: &mut [ApplicationRow]) {
    cohort.sort_by(|a, b| {
        a.effective_rank().cmp(&b.effective_rank()).then_with(|| {
            b.semantic_score
                .unwrap_or(0.0)
                .total_cmp(&a.semantic_score.unwrap_or(0.0))
        })
    });
}

/// Top-N selection for the rerank pass. The sort is stable, so ties keep
/// their original cohort order.
pub fn select_top_n(cohort: &[ApplicationRow], n: usize) -> Vec<ApplicationRow> {
    let mut sorted = cohort.to_vec();
    sort_by_score_desc(&mut sorted);
    sorted.truncate(n);
    sorted
}

/// Assigns batch positions by score, best first. The sort is stable, so
/// equal scores keep their merge order.
fn assign_semantic_ranks(pending: &mut [(Uuid, LayerUpdate)]) {
    let score_of = |update: &LayerUpdate| match update {
        LayerUpdate::Semantic { semantic_score, .. } => *semantic_score,
        _ => 0.0,
    };
    pending.sort_by(|a, b| score_of(&b.1).total_cmp(&score_of(&a.1)));
    for (position, (_, update)) in pending.iter_mut().enumerate() {
        if let LayerUpdate::Semantic { semantic_rank, .. } = update {
            *semantic_rank = Some(position as i32 + 1);
        }
    }
}

/// Fetches the cohort's resumes, recording unreachable ones as per-item
/// failures and pairing each fetched file with its application.
async fn collect_resumes(
    artifacts: &dyn ArtifactFetcher,
    cohort: &[ApplicationRow],
    report: &mut PassReport,
) -> Vec<ResumeFile> {
    let mut files = Vec::new();
    for app in cohort {
        let Some(url) = app.resume_url.as_deref() else {
            report.record_failure(Some(app.id), "no resume reference on file".to_string());
            continue;
        };
        match artifacts.fetch(url).await {
            Ok(artifact) => files.push(ResumeFile {
                filename: resume_filename(app),
                bytes: artifact.bytes,
            }),
            Err(e) => {
                report.record_failure(Some(app.id), format!("resume unreachable: {e}"));
            }
        }
    }
    files
}

/// The "score pending" pass: batch-scores every resume in the cohort
/// against the job's match target and folds results into layer 2.
pub async fn score_pending_pass(
    store: &dyn Store,
    artifacts: &dyn ArtifactFetcher,
    scoring: &dyn ScoringEngine,
    leases: &PassLeases,
    job_id: Uuid,
) -> Result<PassReport, AppError> {
    let _lease = leases
        .try_acquire(job_id)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let job = store
        .job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("job {job_id} not found")))?;
    let context = ScoringContext::from_job(&job);

    let cohort = store.applications_for_job(job_id).await?;
    let mut report = PassReport::new(job_id);

    let files = collect_resumes(artifacts, &cohort, &mut report).await;
    if files.is_empty() {
        return Err(AppError::Validation(
            "no resumes available to score for this job".to_string(),
        ));
    }

    info!(
        "Scoring pass for job {job_id}: {} of {} resumes collected",
        files.len(),
        cohort.len()
    );
    let results = scoring
        .score_batch(&context.match_target(), &files)
        .await?;

    // Merge the whole batch first: semantic ranks are positions within the
    // batch, so they only exist once every result has been folded.
    let mut pending: Vec<(Uuid, LayerUpdate)> = Vec::new();
    for result in &results {
        let Some(app) = parse_application_id(&result.filename)
            .and_then(|id| cohort.iter().find(|a| a.id == id))
        else {
            // Upstream may echo files we never sent; drop them.
            debug!("Dropping unmatched scoring result '{}'", result.filename);
            continue;
        };

        match merge_semantic(result, app) {
            Ok(update) => pending.push((app.id, update)),
            Err(e @ MergeError::Upstream { .. }) => {
                report.record_failure(Some(app.id), e.to_string());
            }
            Err(MergeError::Transition(e)) => {
                report.record_failure(Some(app.id), e.to_string());
            }
        }
    }
    assign_semantic_ranks(&mut pending);

    // Persist each update independently: one failing write never rolls back
    // its siblings.
    for (id, update) in &pending {
        match store.apply_update(*id, update).await {
            Ok(()) => report.succeeded += 1,
            Err(e) => report.record_failure(Some(*id), format!("persist failed: {e}")),
        }
    }

    info!(
        "Scoring pass for job {job_id} done: {} succeeded, {} failed",
        report.succeeded, report.failed
    );
    Ok(report)
}

/// The "rerank top-N" pass: re-fetches the top 8 resumes (stateless by
/// design — no blob caching across passes), asks the reranking endpoint for
/// a verdict and writes state + rank + reasoning per candidate atomically.
pub async fn rerank_top_pass(
    store: &dyn Store,
    artifacts: &dyn ArtifactFetcher,
    scoring: &dyn ScoringEngine,
    leases: &PassLeases,
    job_id: Uuid,
) -> Result<PassReport, AppError> {
    let _lease = leases
        .try_acquire(job_id)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let job = store
        .job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("job {job_id} not found")))?;
    let context = ScoringContext::from_job(&job);

    let cohort = store.applications_for_job(job_id).await?;
    if !cohort.iter().any(|a| a.semantic_score.unwrap_or(0.0) > 0.0) {
        return Err(AppError::Validation(
            "cohort has no scores yet — run a scoring pass first".to_string(),
        ));
    }

    let top = select_top_n(&cohort, RERANK_COHORT_CAP);
    let mut report = PassReport::new(job_id);

    let files = collect_resumes(artifacts, &top, &mut report).await;
    if files.is_empty() {
        return Err(AppError::Validation(
            "no resumes available to rerank for this job".to_string(),
        ));
    }

    info!(
        "Rerank pass for job {job_id}: {} of top {} resumes collected",
        files.len(),
        top.len()
    );
    let results = scoring
        .rerank_batch(&context.match_target(), &files)
        .await?;

    for result in &results {
        // Join strictly against the selected subset: anything else the
        // service echoes is dropped.
        let Some(app) = parse_application_id(&result.filename)
            .and_then(|id| top.iter().find(|a| a.id == id))
        else {
            debug!("Dropping unmatched rerank result '{}'", result.filename);
            continue;
        };

        let update = match merge_rerank(result, app) {
            Ok(update) => update,
            Err(e) => {
                report.record_failure(Some(app.id), e.to_string());
                continue;
            }
        };

        match store.apply_update(app.id, &update).await {
            Ok(()) => report.succeeded += 1,
            Err(e) => report.record_failure(Some(app.id), format!("persist failed: {e}")),
        }
    }

    info!(
        "Rerank pass for job {job_id} done: {} succeeded, {} failed",
        report.succeeded, report.failed
    );
    Ok(report)
}
