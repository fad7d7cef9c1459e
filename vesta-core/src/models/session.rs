use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::Message;

/// One named chat log. Sessions are archived, never deleted; the persisted
/// list keeps creation order, newest appended last.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub messages: Vec<Message>,
    pub started_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(id: String) -> Self {
        Self {
            id,
            messages: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// Generate a fresh session id.
    pub fn generate_id() -> String {
        format!("chat_{}", Uuid::new_v4())
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}
