use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Bytes of a stored resume/video plus the content type the blob store
/// reported, preserved for the proxy response.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytes: Bytes,
    pub content_type: String,
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("fetch failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("blob store returned {0}")]
    Status(u16),
}

/// Retrieves stored artifacts by their opaque blob-store URL.
///
/// Browsers cannot fetch signed storage URLs cross-origin, so the same
/// fetcher also backs the `/api/proxy` route that streams artifact bytes to
/// the UI with the upstream content type preserved.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Artifact, ArtifactError>;
}

pub struct HttpArtifactFetcher {
    client: reqwest::Client,
}

impl HttpArtifactFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ArtifactFetcher for HttpArtifactFetcher {
    async fn fetch(&self, url: &str) -> Result<Artifact, ArtifactError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ArtifactError::Status(status.as_u16()));
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response.bytes().await?;
        Ok(Artifact {
            bytes,
            content_type,
        })
    }
}
