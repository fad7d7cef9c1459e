mod engine;
mod queue;

pub use engine::TranscriptSyncEngine;
pub use queue::{PendingTranscript, RetryQueue};
