pub mod health;
pub mod proxy;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::applications::handlers as applications;
use crate::interviews::handlers as interviews;
use crate::pipeline::handlers as pipeline;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/proxy", get(proxy::proxy_handler))
        // Applications
        .route(
            "/api/v1/jobs/:id/applications",
            post(applications::handle_submit),
        )
        .route(
            "/api/v1/applications",
            get(applications::handle_applications_in_state),
        )
        .route(
            "/api/v1/applications/mine",
            get(applications::handle_my_applications),
        )
        .route(
            "/api/v1/applications/:id",
            get(applications::handle_get_application),
        )
        // Pipeline
        .route(
            "/api/v1/jobs/:id/pipeline/score",
            post(pipeline::handle_score_pass),
        )
        .route(
            "/api/v1/jobs/:id/pipeline/rerank",
            post(pipeline::handle_rerank_pass),
        )
        .route("/api/v1/jobs/:id/candidates", get(pipeline::handle_cohort))
        .route(
            "/api/v1/applications/:id/analyze-video",
            post(pipeline::handle_analyze_video),
        )
        .route(
            "/api/v1/applications/:id/audit-portfolio",
            post(pipeline::handle_audit_portfolio),
        )
        .route(
            "/api/v1/applications/:id/transition",
            post(pipeline::handle_transition),
        )
        // Interviews
        .route(
            "/api/v1/applications/:id/interviews",
            post(interviews::handle_schedule),
        )
        .route("/api/v1/interviews", get(interviews::handle_list))
        .route("/api/v1/interviews/:id", delete(interviews::handle_cancel))
        .route(
            "/api/v1/interviews/:id/complete",
            post(interviews::handle_complete),
        )
        .with_state(state)
}
