pub mod adapters;
pub mod config;
pub mod error;
pub mod flow;
pub mod markup;
pub mod media;
pub mod models;
pub mod sessions;
pub mod storage;
pub mod sync;

pub use adapters::{
    ChatBackendInfo, ChatCompletionClient, HttpListingsLookup, HttpTranscriptStore, LeadDetails,
    LeadRegistration, ListingsLookup, MediaUploadClient, StreamEvent, TranscriptStore, UploadFile,
    UploadResult, VisitorProfile, RECORD_NOT_FOUND_MARKER,
};
pub use config::{
    init_logging, BackendConfig, FlowConfig, LoggingConfig, StorageConfig, SyncConfig, VestaConfig,
};
pub use error::{VestaError, VestaResult};
pub use flow::{
    FlowPhase, GuidedFlow, GuidedFlowState, ACTION_INQUIRE, ACTION_MAIN_MENU,
    ACTION_OPEN_PROPERTIES, LOOKUP_FAILED_REPLY, NO_RESULTS_REPLY, STATUS_ALL,
};
pub use markup::{parse, BlockTag, EmphasisKind, MediaKind, RenderNode};
pub use media::{MediaCarousel, MediaItem, MediaPreviewCoordinator};
pub use models::{
    sanitize_transcript, ChatSession, ContentPart, ListingFilters, ListingStatus, ListingSummary,
    Message, Role, SanitizedMessage,
};
pub use sessions::{SessionManager, GREETING};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
pub use sync::{PendingTranscript, RetryQueue, TranscriptSyncEngine};
