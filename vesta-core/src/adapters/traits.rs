use async_trait::async_trait;

use crate::error::VestaResult;
use crate::models::{ListingFilters, ListingSummary, SanitizedMessage};

use super::types::{LeadDetails, LeadRegistration};

/// Structured property search. The guided flow is the only caller.
#[async_trait]
pub trait ListingsLookup: Send + Sync {
    async fn search(&self, filters: &ListingFilters) -> VestaResult<Vec<ListingSummary>>;
}

/// The inquiry backend: transcript persistence plus lead registration.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Replace the transcript held under `inquiry_id`. Each write is a
    /// cumulative replacement, never a delta.
    async fn save_transcript(
        &self,
        inquiry_id: &str,
        transcript: &[SanitizedMessage],
    ) -> VestaResult<()>;

    /// Create or find the inquiry record for a verified contact identity.
    async fn register_lead(&self, lead: &LeadDetails) -> VestaResult<LeadRegistration>;
}
