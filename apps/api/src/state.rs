use std::sync::Arc;

use crate::clients::{ArtifactFetcher, PortfolioAuditor, ScoringEngine, VideoAnalyzer};
use crate::pipeline::lease::PassLeases;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum
/// extractors. Every external collaborator sits behind an `Arc<dyn ...>`
/// so tests can substitute stubs.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub artifacts: Arc<dyn ArtifactFetcher>,
    pub scoring: Arc<dyn ScoringEngine>,
    pub video: Arc<dyn VideoAnalyzer>,
    pub audit: Arc<dyn PortfolioAuditor>,
    /// Per-job mutual exclusion for batch passes.
    pub leases: PassLeases,
}
