//! Debounced draft saving.
//!
//! Every edit reschedules the save; only a snapshot that survives the quiet
//! period reaches the store. Store writes are serialized, and a debounced
//! save checks for cancellation under the same lock, so a draft that was
//! discarded is never written back by a save already in progress.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::future::{AbortHandle, Abortable};
use intake_types::Payload;
use tokio::sync::mpsc;

use crate::draft::{DraftError, DraftStore};
use crate::events::FormEvent;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

pub struct Autosave {
    store: Arc<dyn DraftStore>,
    key: String,
    debounce: Duration,
    pending: Mutex<Option<AbortHandle>>,
    writes: Arc<Mutex<()>>,
}

impl std::fmt::Debug for Autosave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Autosave")
            .field("key", &self.key)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

impl Autosave {
    pub fn new(store: Arc<dyn DraftStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            debounce: DEFAULT_DEBOUNCE,
            pending: Mutex::new(None),
            writes: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Save `snapshot` once the debounce elapses, superseding any pending save.
    ///
    /// Outside a Tokio runtime the snapshot is written immediately.
    pub fn schedule(&self, snapshot: Payload, events: mpsc::UnboundedSender<FormEvent>) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            self.cancel();
            let _writing = lock(&self.writes);
            save_and_report(self.store.as_ref(), &self.key, &snapshot, &events);
            return;
        };

        let (handle, registration) = AbortHandle::new_pair();
        if let Some(previous) = self.lock_pending().replace(handle.clone()) {
            previous.abort();
        }

        let store = Arc::clone(&self.store);
        let writes = Arc::clone(&self.writes);
        let key = self.key.clone();
        let debounce = self.debounce;
        let task = async move {
            tokio::time::sleep(debounce).await;
            let _writing = lock(&writes);
            // Cancelled after the sleep but before this task took the lock.
            if handle.is_aborted() {
                return;
            }
            save_and_report(store.as_ref(), &key, &snapshot, &events);
        };

        runtime.spawn(async move {
            let _ = Abortable::new(task, registration).await;
        });
    }

    /// Cancel the pending save and write `snapshot` immediately.
    pub fn save_now(
        &self,
        snapshot: &Payload,
        events: &mpsc::UnboundedSender<FormEvent>,
    ) -> Result<(), DraftError> {
        self.cancel();
        let _writing = lock(&self.writes);
        self.store.save(&self.key, snapshot)?;
        tracing::debug!(key = %self.key, fields = snapshot.len(), "Draft saved");
        let _ = events.send(FormEvent::DraftSaved);
        Ok(())
    }

    /// Drop the pending save, if any.
    pub fn cancel(&self) {
        if let Some(handle) = self.lock_pending().take() {
            handle.abort();
        }
    }

    pub fn load(&self) -> Result<Option<Payload>, DraftError> {
        self.store.load(&self.key)
    }

    /// Cancel the pending save and delete the stored draft.
    ///
    /// Waits for a save that is already writing, then removes what it wrote.
    pub fn discard(&self) -> Result<(), DraftError> {
        self.cancel();
        let _writing = lock(&self.writes);
        self.store.remove(&self.key)
    }

    fn lock_pending(&self) -> MutexGuard<'_, Option<AbortHandle>> {
        lock(&self.pending)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Drop for Autosave {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn save_and_report(
    store: &dyn DraftStore,
    key: &str,
    snapshot: &Payload,
    events: &mpsc::UnboundedSender<FormEvent>,
) {
    match store.save(key, snapshot) {
        Ok(()) => {
            tracing::debug!(key, fields = snapshot.len(), "Draft saved");
            let _ = events.send(FormEvent::DraftSaved);
        }
        Err(e) => tracing::warn!(key, "Failed to save draft: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::MemoryDraftStore;
    use crate::events::event_channel;

    fn draft(value: &str) -> Payload {
        let mut payload = Payload::new();
        payload.insert("firstName", value);
        payload
    }

    #[test]
    fn saves_immediately_without_runtime() {
        let store = Arc::new(MemoryDraftStore::new());
        let autosave = Autosave::new(store.clone(), "k");
        let (tx, mut rx) = event_channel();

        autosave.schedule(draft("Jane"), tx);

        assert_eq!(store.load("k").unwrap(), Some(draft("Jane")));
        assert_eq!(rx.try_recv().unwrap(), FormEvent::DraftSaved);
    }

    #[tokio::test(start_paused = true)]
    async fn discard_cancels_pending_save() {
        let store = Arc::new(MemoryDraftStore::new());
        store.save("k", &draft("old")).unwrap();
        let autosave = Autosave::new(store.clone(), "k");
        let (tx, _rx) = event_channel();

        autosave.schedule(draft("new"), tx);
        autosave.discard().unwrap();
        tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;

        assert!(store.load("k").unwrap().is_none());
    }
}
