use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use super::{MediaError, MediaHost, StoredMedia};
use crate::config::ImageKitConfig;

/// Client for ImageKit's upload API.
#[derive(Clone)]
pub struct ImageKitMediaHost {
    client: Client,
    upload_url: String,
    private_key: String,
    folder: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
    #[serde(rename = "filePath")]
    file_path: String,
}

impl ImageKitMediaHost {
    pub fn new(config: &ImageKitConfig) -> Result<Self, MediaError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            upload_url: config.upload_url.clone(),
            private_key: config.private_key.clone().unwrap_or_default(),
            folder: config.folder.clone(),
        })
    }
}

#[async_trait]
impl MediaHost for ImageKitMediaHost {
    async fn store(&self, file: &Path, file_name: &str) -> Result<StoredMedia, MediaError> {
        let bytes = tokio::fs::read(file).await?;
        let size = bytes.len();

        let mut form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()))
            .text("fileName", file_name.to_string());
        if let Some(folder) = &self.folder {
            form = form.text("folder", folder.clone());
        }

        let response = self
            .client
            .post(&self.upload_url)
            .basic_auth(&self.private_key, Some(""))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;

        tracing::info!(file_path = %uploaded.file_path, size, "Uploaded media to ImageKit");
        Ok(StoredMedia {
            url: uploaded.url,
            file_path: uploaded.file_path,
        })
    }
}
