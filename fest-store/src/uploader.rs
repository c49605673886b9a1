use async_trait::async_trait;
use fest_core::{AvatarUploader, UploadError};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::app_config::UploadConfig;

/// Unsigned image upload to a Cloudinary-style endpoint
#[derive(Clone)]
pub struct HttpAvatarUploader {
    client: reqwest::Client,
    upload_url: String,
    upload_preset: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

impl HttpAvatarUploader {
    pub fn new(config: &UploadConfig) -> Result<Self, UploadError> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            upload_url: config.upload_url(),
            upload_preset: config.upload_preset.clone(),
            timeout,
        })
    }

    fn classify(&self, err: reqwest::Error) -> UploadError {
        if err.is_timeout() {
            UploadError::Timeout(self.timeout)
        } else {
            UploadError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl AvatarUploader for HttpAvatarUploader {
    async fn upload(&self, image: Vec<u8>, file_name: &str) -> Result<String, UploadError> {
        if image.is_empty() {
            return Err(UploadError::EmptyPayload);
        }
        let size = image.len();

        let form = Form::new()
            .part("file", Part::bytes(image).file_name(file_name.to_string()))
            .text("upload_preset", self.upload_preset.clone());

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Avatar upload rejected with {}: {}", status, body);
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: UploadResponse = response.json().await.map_err(|e| self.classify(e))?;
        let url = body
            .secure_url
            .filter(|url| !url.is_empty())
            .ok_or(UploadError::MissingUrl)?;

        info!("Uploaded avatar {} ({} bytes)", file_name, size);
        Ok(url)
    }
}
