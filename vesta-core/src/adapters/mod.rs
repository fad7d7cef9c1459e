pub mod chat;
pub mod inquiry;
pub mod listings;
pub mod media_upload;
mod traits;
pub mod types;

pub use chat::{ChatCompletionClient, StreamEvent};
pub use inquiry::{HttpTranscriptStore, RECORD_NOT_FOUND_MARKER};
pub use listings::HttpListingsLookup;
pub use media_upload::{MediaUploadClient, UploadFile};
pub use traits::{ListingsLookup, TranscriptStore};
pub use types::{
    ChatBackendInfo, LeadDetails, LeadRegistration, UploadResult, VisitorProfile,
};
