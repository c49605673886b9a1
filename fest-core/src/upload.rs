use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("Image payload is empty")]
    EmptyPayload,
    #[error("Upload service returned {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("Upload service response had no image URL")]
    MissingUrl,
    #[error("Upload timed out after {0:?}")]
    Timeout(Duration),
    #[error("Upload transport error: {0}")]
    Transport(String),
}

/// Third-party image host that turns an uploaded photo into a public URL
#[async_trait]
pub trait AvatarUploader: Send + Sync {
    async fn upload(&self, image: Vec<u8>, file_name: &str) -> Result<String, UploadError>;
}

/// Uploader with a fixed outcome, for tests and offline runs
pub struct MockAvatarUploader {
    outcome: Result<String, UploadError>,
    delay: Option<Duration>,
}

impl MockAvatarUploader {
    pub fn succeeding(url: impl Into<String>) -> Self {
        Self {
            outcome: Ok(url.into()),
            delay: None,
        }
    }

    pub fn failing(error: UploadError) -> Self {
        Self {
            outcome: Err(error),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl AvatarUploader for MockAvatarUploader {
    async fn upload(&self, image: Vec<u8>, file_name: &str) -> Result<String, UploadError> {
        if image.is_empty() {
            return Err(UploadError::EmptyPayload);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        tracing::info!("Mock upload of {} ({} bytes)", file_name, image.len());
        self.outcome.clone()
    }
}
