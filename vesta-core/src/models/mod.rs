mod listing;
mod message;
mod session;

pub use listing::{ListingFilters, ListingStatus, ListingSummary};
pub use message::{sanitize_transcript, ContentPart, Message, Role, SanitizedMessage};
pub use session::ChatSession;
