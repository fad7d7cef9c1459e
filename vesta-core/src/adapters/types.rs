use serde::{Deserialize, Serialize};

use crate::models::SanitizedMessage;

/// Contact details captured by the lead form before the widget binds an
/// inquiry id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Result of registering a lead: the server creates or finds the inquiry
/// record for that contact identity.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRegistration {
    pub inquiry_id: String,
    /// Present when the inquiry already existed and carries a transcript the
    /// widget can restore.
    #[serde(default)]
    pub transcript: Option<Vec<SanitizedMessage>>,
    pub already_exists: bool,
}

/// Chat completion backend identity, for display only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatBackendInfo {
    pub provider: String,
    pub model: String,
}

/// Free-form visitor profile fields forwarded with each completion request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisitorProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Result of a multipart media upload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub signed_urls: Vec<String>,
}
