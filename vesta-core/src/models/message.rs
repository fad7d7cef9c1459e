use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One part of a message body. Assistant messages arrive from the chat
/// completion stream as an ordered list of parts; user messages carry a
/// single text part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    Reasoning { text: String },
    ToolInvocation { name: String },
}

impl ContentPart {
    pub fn text(value: impl Into<String>) -> Self {
        ContentPart::Text { text: value.into() }
    }

    pub fn reasoning(value: impl Into<String>) -> Self {
        ContentPart::Reasoning { text: value.into() }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ContentPart::Text { .. })
    }
}

/// A single chat message.
///
/// Ids are opaque; creation order is carried by the position in the owning
/// message list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub parts: Vec<ContentPart>,
}

impl Message {
    pub fn new(role: Role, parts: Vec<ContentPart>) -> Self {
        Self {
            id: format!("msg_{}", Uuid::new_v4()),
            role,
            parts,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![ContentPart::text(text)])
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![ContentPart::text(text)])
    }

    /// Flattened text: the concatenation of the `Text` parts in order.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            if let ContentPart::Text { text } = part {
                out.push_str(text);
            }
        }
        out
    }

    /// Reduce the message to the wire shape the transcript store accepts:
    /// non-text parts are dropped, the body is the flattened text.
    pub fn sanitized(&self) -> SanitizedMessage {
        let content = self.text();
        let parts = self
            .parts
            .iter()
            .filter(|p| p.is_text())
            .cloned()
            .collect();
        SanitizedMessage {
            role: self.role,
            content,
            parts,
        }
    }
}

/// The transcript entry shape persisted by the inquiry store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitizedMessage {
    pub role: Role,
    pub content: String,
    pub parts: Vec<ContentPart>,
}

/// Sanitize a full message log for a transcript write.
pub fn sanitize_transcript(messages: &[Message]) -> Vec<SanitizedMessage> {
    messages.iter().map(Message::sanitized).collect()
}
