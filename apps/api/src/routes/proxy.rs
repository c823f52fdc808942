//! Same-origin blob proxy.
//!
//! Browsers cannot fetch signed storage URLs cross-origin, so the UI plays
//! videos and downloads resumes through this route. The upstream content
//! type is preserved on the way back.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: String,
}

/// GET /api/proxy?url=...
pub async fn proxy_handler(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
) -> Result<Response, AppError> {
    let artifact = state.artifacts.fetch(&query.url).await?;
    Ok((
        [(header::CONTENT_TYPE, artifact.content_type)],
        artifact.bytes,
    )
        .into_response())
}
