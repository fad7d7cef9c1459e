use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::BackendConfig;
use crate::error::{VestaError, VestaResult};
use crate::models::SanitizedMessage;

use super::traits::TranscriptStore;
use super::types::{LeadDetails, LeadRegistration};

/// Error substring the backend uses when an inquiry id no longer resolves.
/// Seeing it means the locally held id is dead and must be dropped.
pub const RECORD_NOT_FOUND_MARKER: &str = "record not found";

#[derive(Serialize)]
struct TranscriptBody<'a> {
    transcript: &'a [SanitizedMessage],
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
}

#[derive(Deserialize)]
struct LeadResponseBody {
    inquiry: LeadInquiryBody,
    #[serde(rename = "alreadyExists", default)]
    already_exists: bool,
}

#[derive(Deserialize)]
struct LeadInquiryBody {
    id: String,
    #[serde(default)]
    transcript: Option<Vec<SanitizedMessage>>,
}

/// HTTP consumer of the inquiry backend.
pub struct HttpTranscriptStore {
    client: Client,
    base_url: String,
}

impl HttpTranscriptStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: config.api_base_url.clone(),
        }
    }

    async fn rejection(response: reqwest::Response) -> VestaError {
        let status = response.status();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) if !body.error.is_empty() => body.error,
            _ => status.to_string(),
        };

        if message.to_lowercase().contains(RECORD_NOT_FOUND_MARKER) {
            return VestaError::DeadCorrelation(message);
        }
        if status.is_server_error() {
            return VestaError::ServiceUnavailable(message);
        }
        VestaError::ServerRejection {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl TranscriptStore for HttpTranscriptStore {
    async fn save_transcript(
        &self,
        inquiry_id: &str,
        transcript: &[SanitizedMessage],
    ) -> VestaResult<()> {
        let url = format!("{}/inquiries/{}", self.base_url, inquiry_id);
        debug!(inquiry_id, messages = transcript.len(), "saving transcript");

        let response = self
            .client
            .patch(&url)
            .json(&TranscriptBody { transcript })
            .send()
            .await?;

        if !response.status().is_success() {
            let err = Self::rejection(response).await;
            warn!(inquiry_id, error = %err, "transcript save rejected");
            return Err(err);
        }
        Ok(())
    }

    async fn register_lead(&self, lead: &LeadDetails) -> VestaResult<LeadRegistration> {
        let url = format!("{}/leads", self.base_url);
        debug!(email = %lead.email, "registering lead");

        let response = self.client.post(&url).json(lead).send().await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let body: LeadResponseBody = response
            .json()
            .await
            .map_err(|err| VestaError::MalformedResponse(err.to_string()))?;

        Ok(LeadRegistration {
            inquiry_id: body.inquiry.id,
            transcript: body.inquiry.transcript,
            already_exists: body.already_exists,
        })
    }
}
