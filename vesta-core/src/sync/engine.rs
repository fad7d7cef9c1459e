//! Debounced, cancellable transcript persistence.
//!
//! Every message mutation notifies the engine; the engine collapses bursts
//! into one write per quiet period, keeps at most one request in flight per
//! inquiry, and supersedes older work whenever newer work arrives. Losing an
//! intermediate snapshot is fine: each write replaces the whole transcript.
//!
//! Nothing in here ever returns an error to the caller. Failures end up in
//! the durable retry queue or in the log.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::oneshot;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

use crate::adapters::TranscriptStore;
use crate::config::SyncConfig;
use crate::error::VestaError;
use crate::models::{sanitize_transcript, Message, Role, SanitizedMessage};
use crate::storage::KeyValueStore;

use super::queue::{PendingTranscript, RetryQueue};

const BOUND_INQUIRY_KEY: &str = "bound_inquiry_id";

/// A snapshot whose send was suppressed because the assistant was still
/// streaming when the debounce timer fired.
struct HeldFlush {
    generation: u64,
    inquiry_id: String,
    snapshot: Vec<SanitizedMessage>,
}

struct EngineState {
    /// Monotonically increasing task generation. A response is applied only
    /// if its generation is still the latest.
    generation: u64,
    debounce_cancel: Option<oneshot::Sender<()>>,
    inflight_cancel: Option<oneshot::Sender<()>>,
    inflight_generation: u64,
    streaming: bool,
    held: Option<HeldFlush>,
    bound_inquiry: Option<String>,
}

struct EngineInner {
    store: Arc<dyn TranscriptStore>,
    kv: Arc<dyn KeyValueStore>,
    queue: RetryQueue,
    config: SyncConfig,
    // NOTE: std::sync::Mutex since the lock is never held across .await.
    state: Mutex<EngineState>,
}

#[derive(Clone)]
pub struct TranscriptSyncEngine {
    inner: Arc<EngineInner>,
}

impl TranscriptSyncEngine {
    pub fn new(
        store: Arc<dyn TranscriptStore>,
        kv: Arc<dyn KeyValueStore>,
        config: SyncConfig,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                store,
                queue: RetryQueue::new(kv.clone()),
                kv,
                config,
                state: Mutex::new(EngineState {
                    generation: 0,
                    debounce_cancel: None,
                    inflight_cancel: None,
                    inflight_generation: 0,
                    streaming: false,
                    held: None,
                    bound_inquiry: None,
                }),
            }),
        }
    }

    /// Bind the inquiry correlation id subsequent writes target.
    pub async fn bind_inquiry(&self, inquiry_id: &str) {
        {
            let mut state = self.inner.state.lock().expect("sync state lock");
            state.bound_inquiry = Some(inquiry_id.to_string());
        }
        if let Err(err) = self.inner.kv.set(BOUND_INQUIRY_KEY, inquiry_id).await {
            warn!(error = %err, "failed to cache bound inquiry id");
        }
    }

    /// Restore a previously bound inquiry id from durable storage.
    pub async fn restore_bound_inquiry(&self) {
        if let Ok(Some(id)) = self.inner.kv.get(BOUND_INQUIRY_KEY).await {
            let mut state = self.inner.state.lock().expect("sync state lock");
            state.bound_inquiry = Some(id);
        }
    }

    pub fn inquiry_id(&self) -> Option<String> {
        self.inner
            .state
            .lock()
            .expect("sync state lock")
            .bound_inquiry
            .clone()
    }

    /// Record a message-log mutation. Restarts the debounce timer; only the
    /// timer that survives the quiet period uninterrupted fires a write.
    pub fn notify_changed(&self, messages: &[Message], inquiry_id: &str) {
        let snapshot = sanitize_transcript(messages);
        let inquiry_id = inquiry_id.to_string();

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let generation = {
            let mut state = self.inner.state.lock().expect("sync state lock");
            state.generation += 1;
            if let Some(previous) = state.debounce_cancel.replace(cancel_tx) {
                let _ = previous.send(());
            }
            state.generation
        };

        let inner = self.inner.clone();
        tokio::spawn(async move {
            let debounce = Duration::from_millis(inner.config.debounce_ms);
            tokio::select! {
                _ = sleep(debounce) => {}
                _ = cancel_rx => {
                    debug!(generation, "debounce restarted");
                    return;
                }
            }
            fire(inner, generation, inquiry_id, snapshot).await;
        });
    }

    /// Mark the newest assistant message as still being produced. Writes are
    /// held while this is set.
    pub fn begin_streaming(&self) {
        let mut state = self.inner.state.lock().expect("sync state lock");
        state.streaming = true;
    }

    /// Production finished; release any held write immediately.
    pub fn finish_streaming(&self) {
        let held = {
            let mut state = self.inner.state.lock().expect("sync state lock");
            state.streaming = false;
            state.held.take()
        };

        if let Some(held) = held {
            let inner = self.inner.clone();
            tokio::spawn(async move {
                fire(inner, held.generation, held.inquiry_id, held.snapshot).await;
            });
        }
    }

    /// Attempt every queued unsynced write once, dropping the ones that
    /// succeed. Intended for widget startup.
    pub async fn flush_pending(&self) {
        let entries = match self.inner.queue.entries().await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(error = %err, "could not read unsynced queue");
                return;
            }
        };

        for entry in entries {
            match self
                .inner
                .store
                .save_transcript(&entry.inquiry_id, &entry.messages)
                .await
            {
                Ok(()) => {
                    info!(inquiry_id = %entry.inquiry_id, "flushed queued transcript");
                    if let Err(err) = self
                        .inner
                        .queue
                        .remove(&entry.inquiry_id, entry.timestamp)
                        .await
                    {
                        warn!(error = %err, "could not drop flushed queue entry");
                    }
                }
                Err(err) if err.is_dead_correlation() => {
                    invalidate_inquiry(&self.inner, &entry.inquiry_id).await;
                }
                Err(err) => {
                    debug!(inquiry_id = %entry.inquiry_id, error = %err, "queued flush failed, keeping entry");
                }
            }
        }
    }

    /// Cancel timers and in-flight work. Required on teardown and session
    /// switch so nothing fires against a stale target.
    pub fn shutdown(&self) {
        let mut state = self.inner.state.lock().expect("sync state lock");
        state.generation += 1;
        state.held = None;
        if let Some(tx) = state.debounce_cancel.take() {
            let _ = tx.send(());
        }
        if let Some(tx) = state.inflight_cancel.take() {
            let _ = tx.send(());
        }
    }
}

/// Send one snapshot, honoring supersession, streaming suppression, the
/// request timeout and the failure queue.
async fn fire(
    inner: Arc<EngineInner>,
    generation: u64,
    inquiry_id: String,
    snapshot: Vec<SanitizedMessage>,
) {
    let cancel_rx = {
        let mut state = inner.state.lock().expect("sync state lock");
        if generation != state.generation {
            debug!(generation, "snapshot superseded before send");
            return;
        }

        let assistant_last = snapshot.last().map(|m| m.role) == Some(Role::Assistant);
        if state.streaming && assistant_last {
            debug!(generation, "assistant still streaming, holding write");
            state.held = Some(HeldFlush {
                generation,
                inquiry_id,
                snapshot,
            });
            return;
        }

        let (cancel_tx, cancel_rx) = oneshot::channel();
        if let Some(previous) = state.inflight_cancel.replace(cancel_tx) {
            let _ = previous.send(());
        }
        state.inflight_generation = generation;
        cancel_rx
    };

    let request_timeout = Duration::from_secs(inner.config.request_timeout_secs);
    let send = inner.store.save_transcript(&inquiry_id, &snapshot);

    tokio::select! {
        _ = cancel_rx => {
            debug!(generation, %inquiry_id, "in-flight write superseded");
        }
        outcome = timeout(request_timeout, send) => {
            clear_inflight(&inner, generation);
            match outcome {
                // Timeout is supersession by the clock, not a failure.
                Err(_elapsed) => {
                    debug!(generation, %inquiry_id, "transcript write timed out");
                }
                Ok(Ok(())) => {
                    debug!(generation, %inquiry_id, messages = snapshot.len(), "transcript synced");
                }
                Ok(Err(err)) if err.is_cancellation() => {
                    debug!(generation, %inquiry_id, "transcript write cancelled");
                }
                Ok(Err(err)) if err.is_dead_correlation() => {
                    invalidate_inquiry(&inner, &inquiry_id).await;
                }
                Ok(Err(err)) => {
                    queue_and_retry(inner.clone(), generation, inquiry_id, snapshot, err).await;
                }
            }
        }
    }
}

fn clear_inflight(inner: &Arc<EngineInner>, generation: u64) {
    let mut state = inner.state.lock().expect("sync state lock");
    if state.inflight_generation == generation {
        state.inflight_cancel = None;
    }
}

/// Queue the failed snapshot durably, then schedule exactly one retry. The
/// retry is skipped if newer work supersedes it first; the queue entry then
/// waits for the next startup flush.
async fn queue_and_retry(
    inner: Arc<EngineInner>,
    generation: u64,
    inquiry_id: String,
    snapshot: Vec<SanitizedMessage>,
    err: VestaError,
) {
    warn!(%inquiry_id, error = %err, "transcript write failed, queueing");

    let pending = PendingTranscript {
        inquiry_id: inquiry_id.clone(),
        messages: snapshot.clone(),
        timestamp: Utc::now(),
    };
    if let Err(queue_err) = inner.queue.push(pending.clone()).await {
        warn!(error = %queue_err, "could not persist unsynced transcript");
    }

    let retry_delay = Duration::from_millis(inner.config.retry_delay_ms);
    tokio::spawn(async move {
        sleep(retry_delay).await;

        {
            let state = inner.state.lock().expect("sync state lock");
            if generation != state.generation {
                debug!(generation, "retry superseded, leaving entry queued");
                return;
            }
        }

        let request_timeout = Duration::from_secs(inner.config.request_timeout_secs);
        match timeout(
            request_timeout,
            inner.store.save_transcript(&inquiry_id, &snapshot),
        )
        .await
        {
            Ok(Ok(())) => {
                info!(%inquiry_id, "transcript retry succeeded");
                if let Err(err) = inner.queue.remove(&inquiry_id, pending.timestamp).await {
                    warn!(error = %err, "could not drop retried queue entry");
                }
            }
            Ok(Err(err)) if err.is_dead_correlation() => {
                invalidate_inquiry(&inner, &inquiry_id).await;
            }
            Ok(Err(err)) => {
                warn!(%inquiry_id, error = %err, "transcript retry failed, entry stays queued");
            }
            Err(_elapsed) => {
                debug!(%inquiry_id, "transcript retry timed out, entry stays queued");
            }
        }
    });
}

/// The server no longer knows this inquiry id: clear it from the engine,
/// the durable cache and the retry queue so nothing keeps targeting it.
async fn invalidate_inquiry(inner: &Arc<EngineInner>, inquiry_id: &str) {
    info!(inquiry_id, "inquiry record gone, invalidating local id");
    {
        let mut state = inner.state.lock().expect("sync state lock");
        if state.bound_inquiry.as_deref() == Some(inquiry_id) {
            state.bound_inquiry = None;
        }
    }
    if let Err(err) = inner.kv.remove(BOUND_INQUIRY_KEY).await {
        warn!(error = %err, "could not clear cached inquiry id");
    }
    if let Err(err) = inner.queue.purge(inquiry_id).await {
        warn!(error = %err, "could not purge queue for dead inquiry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{LeadDetails, LeadRegistration};
    use crate::error::VestaResult;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;

    struct NullStore;

    #[async_trait]
    impl TranscriptStore for NullStore {
        async fn save_transcript(
            &self,
            _inquiry_id: &str,
            _transcript: &[SanitizedMessage],
        ) -> VestaResult<()> {
            Ok(())
        }

        async fn register_lead(&self, _lead: &LeadDetails) -> VestaResult<LeadRegistration> {
            Err(VestaError::Internal("unused".to_string()))
        }
    }

    fn engine() -> TranscriptSyncEngine {
        TranscriptSyncEngine::new(
            Arc::new(NullStore),
            Arc::new(MemoryStore::new()),
            SyncConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_bind_and_invalidate_inquiry() {
        let engine = engine();
        assert_eq!(engine.inquiry_id(), None);

        engine.bind_inquiry("inq_1").await;
        assert_eq!(engine.inquiry_id(), Some("inq_1".to_string()));

        invalidate_inquiry(&engine.inner, "inq_1").await;
        assert_eq!(engine.inquiry_id(), None);
        assert_eq!(engine.inner.kv.get(BOUND_INQUIRY_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_restore_bound_inquiry() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        kv.set(BOUND_INQUIRY_KEY, "inq_5").await.unwrap();

        let engine =
            TranscriptSyncEngine::new(Arc::new(NullStore), kv, SyncConfig::default());
        engine.restore_bound_inquiry().await;
        assert_eq!(engine.inquiry_id(), Some("inq_5".to_string()));
    }

    #[tokio::test]
    async fn test_shutdown_clears_timers() {
        let engine = engine();
        engine.notify_changed(&[Message::user("hi")], "inq_1");
        engine.shutdown();

        let state = engine.inner.state.lock().unwrap();
        assert!(state.debounce_cancel.is_none());
        assert!(state.inflight_cancel.is_none());
        assert!(state.held.is_none());
    }
}
