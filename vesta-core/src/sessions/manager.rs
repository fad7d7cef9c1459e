//! Named chat log management.
//!
//! The widget keeps every conversation the visitor ever started; starting a
//! new chat archives the current log in place and seeds a fresh one. The
//! persisted list is append-ordered by creation, independent of which
//! session is active later.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{VestaError, VestaResult};
use crate::models::{ChatSession, Message};
use crate::storage::KeyValueStore;

const SESSIONS_KEY: &str = "chat_sessions";
const ACTIVE_SESSION_KEY: &str = "active_session_id";

/// The canonical greeting seeding every new session.
pub const GREETING: &str = "Hi! I'm Vesta, your property assistant. Ask me anything about our listings, or pick an option below.\n\n[CHOICES]Inquire A Property|Open Properties Page[/CHOICES]";

pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    sessions: Vec<ChatSession>,
    active_id: String,
}

impl SessionManager {
    /// Load the persisted session list, creating the first session when none
    /// exists yet.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> VestaResult<Self> {
        let sessions: Vec<ChatSession> = match store.get(SESSIONS_KEY).await? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        };
        let stored_active = store.get(ACTIVE_SESSION_KEY).await?;

        let mut manager = Self {
            store,
            sessions,
            active_id: String::new(),
        };

        let active_id = stored_active
            .filter(|id| manager.sessions.iter().any(|s| &s.id == id))
            .or_else(|| manager.sessions.last().map(|s| s.id.clone()));

        match active_id {
            Some(id) => {
                manager.active_id = id;
            }
            None => {
                info!("no stored sessions, creating initial session");
                manager.append_fresh_session().await?;
            }
        }

        Ok(manager)
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    pub fn active_session(&self) -> &ChatSession {
        self.sessions
            .iter()
            .find(|s| s.id == self.active_id)
            .expect("active id always points at a stored session")
    }

    pub fn active_messages(&self) -> &[Message] {
        &self.active_session().messages
    }

    /// Archive the current log under its id and make a freshly seeded
    /// session active. The new session's id is collision-checked against
    /// every stored id.
    pub async fn start_new_session(&mut self) -> VestaResult<&ChatSession> {
        // The active log already lives in the list under its own id; it is
        // archived simply by no longer being active.
        self.append_fresh_session().await?;
        Ok(self.active_session())
    }

    /// Make a stored session active, replacing the visible message list
    /// verbatim. The session being left is not touched.
    pub async fn switch_to(&mut self, session_id: &str) -> VestaResult<()> {
        if !self.sessions.iter().any(|s| s.id == session_id) {
            return Err(VestaError::SessionNotFound(session_id.to_string()));
        }
        debug!(session_id, "switching active session");
        self.active_id = session_id.to_string();
        self.store.set(ACTIVE_SESSION_KEY, &self.active_id).await?;
        Ok(())
    }

    /// Update the active session's entry in place after a message mutation.
    pub async fn record_mutation(&mut self, messages: Vec<Message>) -> VestaResult<()> {
        let active_id = self.active_id.clone();
        let session = self
            .sessions
            .iter_mut()
            .find(|s| s.id == active_id)
            .ok_or_else(|| VestaError::SessionNotFound(active_id.clone()))?;
        session.messages = messages;
        self.persist_sessions().await
    }

    fn unique_session_id(&self) -> String {
        let mut id = ChatSession::generate_id();
        while self.sessions.iter().any(|s| s.id == id) {
            id = ChatSession::generate_id();
        }
        id
    }

    async fn append_fresh_session(&mut self) -> VestaResult<()> {
        let id = self.unique_session_id();
        let mut session = ChatSession::new(id.clone());
        session.messages.push(Message::assistant(GREETING));

        self.sessions.push(session);
        self.active_id = id;

        self.persist_sessions().await?;
        self.store.set(ACTIVE_SESSION_KEY, &self.active_id).await?;
        Ok(())
    }

    async fn persist_sessions(&self) -> VestaResult<()> {
        let raw = serde_json::to_string(&self.sessions)?;
        self.store.set(SESSIONS_KEY, &raw).await
    }
}
