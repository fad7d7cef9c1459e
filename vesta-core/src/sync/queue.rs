use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::VestaResult;
use crate::models::SanitizedMessage;
use crate::storage::KeyValueStore;

const QUEUE_KEY: &str = "unsynced_transcripts";

/// One transcript write that failed and is waiting for its retry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingTranscript {
    pub inquiry_id: String,
    pub messages: Vec<SanitizedMessage>,
    pub timestamp: DateTime<Utc>,
}

/// Durable queue of unsynced transcript writes, kept behind the key-value
/// port so a widget restart does not lose them.
pub struct RetryQueue {
    store: Arc<dyn KeyValueStore>,
}

impl RetryQueue {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn entries(&self) -> VestaResult<Vec<PendingTranscript>> {
        match self.store.get(QUEUE_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn push(&self, pending: PendingTranscript) -> VestaResult<()> {
        let mut entries = self.entries().await?;
        debug!(
            inquiry_id = %pending.inquiry_id,
            queued = entries.len() + 1,
            "queueing unsynced transcript"
        );
        entries.push(pending);
        self.persist(&entries).await
    }

    /// Drop the entry matching one queued write exactly.
    pub async fn remove(&self, inquiry_id: &str, timestamp: DateTime<Utc>) -> VestaResult<()> {
        let mut entries = self.entries().await?;
        entries.retain(|e| !(e.inquiry_id == inquiry_id && e.timestamp == timestamp));
        self.persist(&entries).await
    }

    /// Drop every entry targeting an inquiry id, used when the id dies.
    pub async fn purge(&self, inquiry_id: &str) -> VestaResult<()> {
        let mut entries = self.entries().await?;
        entries.retain(|e| e.inquiry_id != inquiry_id);
        self.persist(&entries).await
    }

    async fn persist(&self, entries: &[PendingTranscript]) -> VestaResult<()> {
        if entries.is_empty() {
            return self.store.remove(QUEUE_KEY).await;
        }
        let raw = serde_json::to_string(entries)?;
        self.store.set(QUEUE_KEY, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Message, Role};
    use crate::storage::MemoryStore;

    fn pending(inquiry_id: &str) -> PendingTranscript {
        PendingTranscript {
            inquiry_id: inquiry_id.to_string(),
            messages: vec![Message::user("hello").sanitized()],
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_push_and_remove() {
        let queue = RetryQueue::new(Arc::new(MemoryStore::new()));
        assert!(queue.entries().await.unwrap().is_empty());

        let entry = pending("inq_1");
        queue.push(entry.clone()).await.unwrap();
        assert_eq!(queue.entries().await.unwrap().len(), 1);

        queue.remove(&entry.inquiry_id, entry.timestamp).await.unwrap();
        assert!(queue.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_purge_drops_only_matching_inquiry() {
        let queue = RetryQueue::new(Arc::new(MemoryStore::new()));
        queue.push(pending("inq_1")).await.unwrap();
        queue.push(pending("inq_1")).await.unwrap();
        queue.push(pending("inq_2")).await.unwrap();

        queue.purge("inq_1").await.unwrap();

        let entries = queue.entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].inquiry_id, "inq_2");
    }

    #[tokio::test]
    async fn test_entries_survive_reload() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let queue = RetryQueue::new(store.clone());
        queue.push(pending("inq_9")).await.unwrap();

        let reopened = RetryQueue::new(store);
        let entries = reopened.entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].messages[0].role, Role::User);
    }
}
