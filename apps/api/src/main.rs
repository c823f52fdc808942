mod applications;
mod auth;
mod clients;
mod config;
mod db;
mod errors;
mod interviews;
mod models;
mod pipeline;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod testutil;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::clients::{
    build_http_client, HttpArtifactFetcher, HttpPortfolioAuditor, HttpScoringEngine,
    HttpVideoAnalyzer,
};
use crate::config::Config;
use crate::db::create_pool;
use crate::pipeline::lease::PassLeases;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::pg::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Tracing targets use the crate name with underscores.
            let crate_target = env!("CARGO_PKG_NAME").replace('-', "_");
            EnvFilter::new(format!("{crate_target}={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting DeepScreen API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let pool = create_pool(&config.database_url).await?;
    let store = Arc::new(PgStore::new(pool));

    // One HTTP client shared by every external collaborator
    let http = build_http_client();
    let artifacts = Arc::new(HttpArtifactFetcher::new(http.clone()));
    let scoring = Arc::new(HttpScoringEngine::new(
        http.clone(),
        config.scoring_api_url.clone(),
    ));
    let video = Arc::new(HttpVideoAnalyzer::new(
        http.clone(),
        config.video_api_url.clone(),
    ));
    let audit = Arc::new(HttpPortfolioAuditor::new(
        http,
        config.audit_api_url.clone(),
    ));
    info!("External service clients initialized");

    // Build app state
    let state = AppState {
        store,
        artifacts,
        scoring,
        video,
        audit,
        leases: PassLeases::new(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
