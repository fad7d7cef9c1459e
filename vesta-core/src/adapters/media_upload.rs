use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::debug;

use crate::config::BackendConfig;
use crate::error::{VestaError, VestaResult};

use super::types::UploadResult;

/// One file queued for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Multipart consumer of the media upload endpoint. Storage mechanics behind
/// the endpoint are the backend's concern; the widget only needs the
/// returned paths and signed URLs.
pub struct MediaUploadClient {
    client: Client,
    base_url: String,
}

impl MediaUploadClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(config.api_base_url.clone())
    }

    pub async fn upload(&self, files: Vec<UploadFile>) -> VestaResult<UploadResult> {
        if files.is_empty() {
            return Err(VestaError::ValidationError(
                "no files to upload".to_string(),
            ));
        }

        let url = format!("{}/uploads", self.base_url);
        debug!(count = files.len(), "uploading media");

        let mut form = Form::new();
        for file in files {
            let part = Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.mime)
                .map_err(|err| VestaError::ValidationError(err.to_string()))?;
            form = form.part("files", part);
        }

        let response = self.client.post(&url).multipart(form).send().await?;

        if !response.status().is_success() {
            return Err(VestaError::ServerRejection {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        response
            .json::<UploadResult>()
            .await
            .map_err(|err| VestaError::MalformedResponse(err.to_string()))
    }
}
