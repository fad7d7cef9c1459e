mod format;
mod machine;
mod state;

pub use format::{
    format_listing_reply, properties_page_link, with_default_actions, DEFAULT_ACTIONS,
    LOOKUP_FAILED_REPLY, NO_RESULTS_REPLY,
};
pub use machine::{
    GuidedFlow, ACTION_INQUIRE, ACTION_MAIN_MENU, ACTION_OPEN_PROPERTIES, STATUS_ALL,
};
pub use state::{FlowPhase, GuidedFlowState};
