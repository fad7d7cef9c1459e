use std::sync::Arc;

use vesta_core::models::Message;
use vesta_core::sessions::{SessionManager, GREETING};
use vesta_core::storage::{KeyValueStore, MemoryStore};

mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn test_first_load_seeds_greeting_session() {
        let manager = SessionManager::load(Arc::new(MemoryStore::new()))
            .await
            .unwrap();

        assert_eq!(manager.sessions().len(), 1);
        assert_eq!(manager.active_messages().len(), 1);
        assert_eq!(manager.active_messages()[0].text(), GREETING);
    }

    #[tokio::test]
    async fn test_switch_leaves_left_session_byte_identical() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut manager = SessionManager::load(store.clone()).await.unwrap();
        let first_id = manager.active_id().to_string();

        manager
            .record_mutation(vec![
                Message::assistant(GREETING),
                Message::user("any 2BR in Mandaue?"),
                Message::assistant("Let me check."),
            ])
            .await
            .unwrap();

        // Capture the raw persisted bytes of the session being left.
        let persisted_before = store.get("chat_sessions").await.unwrap().unwrap();

        manager.start_new_session().await.unwrap();
        manager.switch_to(&first_id).await.unwrap();
        manager.start_new_session().await.unwrap();
        manager.switch_to(&first_id).await.unwrap();

        let persisted_after = store.get("chat_sessions").await.unwrap().unwrap();
        let before: serde_json::Value = serde_json::from_str(&persisted_before).unwrap();
        let after: serde_json::Value = serde_json::from_str(&persisted_after).unwrap();
        assert_eq!(
            before.as_array().unwrap()[0],
            after.as_array().unwrap()[0],
            "the stored log of the first session never changes across switches"
        );

        assert_eq!(manager.active_messages().len(), 3);
        assert_eq!(manager.active_messages()[1].text(), "any 2BR in Mandaue?");
    }

    #[tokio::test]
    async fn test_archive_order_is_creation_order() {
        let mut manager = SessionManager::load(Arc::new(MemoryStore::new()))
            .await
            .unwrap();

        let first = manager.active_id().to_string();
        manager.start_new_session().await.unwrap();
        let second = manager.active_id().to_string();
        manager.start_new_session().await.unwrap();
        let third = manager.active_id().to_string();

        // Re-activating an old session must not reorder the archive.
        manager.switch_to(&first).await.unwrap();
        manager
            .record_mutation(vec![Message::user("still here")])
            .await
            .unwrap();

        let ids: Vec<&str> = manager.sessions().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec![first.as_str(), second.as_str(), third.as_str()]);
    }

    #[tokio::test]
    async fn test_every_new_session_starts_with_the_canonical_greeting() {
        let mut manager = SessionManager::load(Arc::new(MemoryStore::new()))
            .await
            .unwrap();
        manager.start_new_session().await.unwrap();
        manager.start_new_session().await.unwrap();

        for session in manager.sessions() {
            assert_eq!(session.messages[0].text(), GREETING);
        }
    }
}
