//! Session-owned deferred work
//!
//! Timers are tokio tasks that are aborted when rescheduled, cancelled, or
//! dropped, so nothing outlives the session that started it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use super::client::DocumentStore;
use super::SessionEvent;
use crate::annotations::DocumentPatch;

/// A spawned task that is aborted on drop
#[derive(Debug)]
pub struct DeferredTask {
    handle: JoinHandle<()>,
}

impl DeferredTask {
    /// Run `work` after `delay`
    pub fn spawn<F>(delay: Duration, work: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            work.await;
        });
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for DeferredTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Debounced autosave.
///
/// Every change re-arms a single timer; only the last change within the quiet
/// period is persisted. Only the timer is cancellable: once it fires, the save
/// runs detached and always reports back. The first change after a load is
/// skipped.
#[derive(Debug)]
pub struct Autosave {
    delay: Duration,
    skip_next: bool,
    generation: u64,
    pending: Option<DeferredTask>,
}

impl Autosave {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            skip_next: true,
            generation: 0,
            pending: None,
        }
    }

    /// Skip the next change notification (used right after a load)
    pub fn skip_next(&mut self) {
        self.skip_next = true;
    }

    /// Generation of the most recently scheduled save
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the quiet-period timer is armed
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Record a change and (re)schedule the save.
    ///
    /// Returns false when the change was swallowed by the skip flag.
    pub fn changed(
        &mut self,
        store: Arc<dyn DocumentStore>,
        doc_id: &str,
        patch: DocumentPatch,
        events: UnboundedSender<SessionEvent>,
    ) -> bool {
        if std::mem::take(&mut self.skip_next) {
            tracing::trace!("Skipping autosave for initial load of {}", doc_id);
            return false;
        }

        self.generation += 1;
        let generation = self.generation;
        let doc_id = doc_id.to_string();
        self.pending = Some(DeferredTask::spawn(self.delay, async move {
            // Detached so a later reschedule cannot abort a request in flight
            tokio::spawn(async move {
                tracing::debug!("Autosaving document {} (#{})", doc_id, generation);
                let result = store
                    .save(&doc_id, &patch)
                    .await
                    .map(|_| ())
                    .map_err(|e| e.to_string());
                // The receiver is gone only if the session was dropped
                let _ = events.send(SessionEvent::AutosaveFinished { generation, result });
            });
        }));
        true
    }

    /// Disarm the timer. A save already started still completes.
    pub fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            task.cancel();
        }
    }
}
