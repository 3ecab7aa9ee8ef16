//! View session for one open document
//!
//! The session owns the annotation store, the mode machine and the note
//! popup of a single document. Input arrives as commands and pointer events,
//! all handled synchronously; persistence runs on session-owned timers that
//! are cancelled when the session closes.
//!
//! # Errors
//!
//! - Load failure: [`ViewSession::open`] fails and the caller abandons the
//!   session (back to the document list).
//! - Save failure: reported as a [`StatusMessage`]; the session stays dirty
//!   until a later save succeeds. There is no automatic retry.

mod client;
mod mode;
mod popup;
mod scroll;
mod timer;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::annotations::{
    map_selection, Annotation, AnnotationStore, Document, DocumentPatch, Mutation, PageLayout,
    ScreenRect, SelectionSnapshot,
};
use crate::config::SessionConfig;

pub use client::{DocumentStore, HttpDocumentStore, StoreError};
pub use mode::{
    AnnotationMode, Command, Key, KeyInput, ModeMachine, ModePolicy, ViewerBehavior,
};
pub use popup::{Point, PopupController};
pub use scroll::{ScrollMemory, ScrollRecord};
pub use timer::{Autosave, DeferredTask};

/// Session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to load document: {0}")]
    Load(#[source] StoreError),

    #[error("Failed to save document: {0}")]
    Save(#[source] StoreError),
}

/// Messages produced by session timers
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// An autosave completed; `Err` carries the failure text
    AutosaveFinished {
        generation: u64,
        result: Result<(), String>,
    },
    /// Time to (re)apply the saved scroll position
    RestoreScroll(ScrollRecord),
}

/// Transient, non-blocking notice for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    Saved,
    SaveFailed(String),
    AutosaveFailed(String),
}

/// An open document and its editing state
pub struct ViewSession {
    config: SessionConfig,
    store: Arc<dyn DocumentStore>,
    document: Document,
    annotations: AnnotationStore,
    mode: ModeMachine,
    popup: PopupController,
    autosave: Autosave,
    scroll: Option<ScrollMemory>,
    scroll_restores: Vec<DeferredTask>,
    events_tx: UnboundedSender<SessionEvent>,
    events_rx: UnboundedReceiver<SessionEvent>,
    status: Option<StatusMessage>,
    dirty: bool,
}

impl ViewSession {
    /// Load `doc_id` and start a session for it.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn open(
        store: Arc<dyn DocumentStore>,
        doc_id: &str,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let mut document = store.load(doc_id).await.map_err(|e| {
            tracing::warn!("Failed to load document {}: {}", doc_id, e);
            SessionError::Load(e)
        })?;
        tracing::info!(
            "Opened document {} with {} annotations",
            document.id,
            document.annotations.len()
        );

        let annotations = AnnotationStore::new(
            std::mem::take(&mut document.annotations),
            config.history_limit,
        );
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let mut session = Self {
            store,
            document,
            annotations,
            mode: ModeMachine::new(config.mode_policy),
            popup: PopupController::new(),
            autosave: Autosave::new(config.autosave_delay),
            scroll: config.scroll_file.clone().map(ScrollMemory::new),
            scroll_restores: Vec::new(),
            events_tx,
            events_rx,
            status: None,
            dirty: false,
            config,
        };

        // Loading counts as a change; the autosave skip flag swallows it
        session.document_changed();
        session.schedule_scroll_restore();

        Ok(session)
    }

    /// Document metadata (annotations live in [`Self::annotations`])
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The document as it would be saved now
    pub fn snapshot(&self) -> Document {
        Document {
            annotations: self.annotations.annotations().to_vec(),
            ..self.document.clone()
        }
    }

    pub fn annotations(&self) -> &[Annotation] {
        self.annotations.annotations()
    }

    pub fn mode(&self) -> AnnotationMode {
        self.mode.mode()
    }

    pub fn viewer_behavior(&self) -> ViewerBehavior {
        self.mode.viewer_behavior()
    }

    pub fn hit_targets_active(&self) -> bool {
        self.mode.hit_targets_active()
    }

    pub fn popup(&self) -> &PopupController {
        &self.popup
    }

    pub fn can_undo(&self) -> bool {
        self.annotations.can_undo()
    }

    /// True while there are changes no save has confirmed
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn autosave_pending(&self) -> bool {
        self.autosave.is_pending()
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    /// Route a command to its handler. Returns true if state changed.
    pub fn dispatch(&mut self, command: Command) -> bool {
        match command {
            Command::SetMode(mode) => self.mode.set(mode),
            Command::Undo => {
                if !self.annotations.undo() {
                    return false;
                }
                let orphaned = self
                    .popup
                    .active_id()
                    .is_some_and(|id| self.annotations.get(id).is_none());
                if orphaned {
                    self.popup.close();
                }
                self.document_changed();
                true
            }
            Command::ClosePopup => {
                let was_open = self.popup.is_open();
                self.popup.close();
                was_open
            }
            Command::CommitPopup => {
                let changed = self.popup.commit(&mut self.annotations);
                if changed {
                    self.document_changed();
                }
                changed
            }
            Command::DeleteFromPopup => {
                let deleted = self.popup.delete(&mut self.annotations);
                if deleted {
                    self.document_changed();
                }
                deleted
            }
        }
    }

    /// Handle a key press
    pub fn key(&mut self, input: KeyInput) -> bool {
        match input.command() {
            Some(command) => self.dispatch(command),
            None => false,
        }
    }

    /// Pointer released over the viewer.
    ///
    /// In highlight or underline mode the captured selection becomes one
    /// annotation per page it covers. Returns the number created.
    pub fn pointer_up(&mut self, selection: &SelectionSnapshot, pages: &[PageLayout]) -> usize {
        let Some(kind) = self.mode.selection_kind() else {
            return 0;
        };
        if selection.is_collapsed() {
            return 0;
        }

        let created = map_selection(selection, pages, kind);
        let count = created.len();
        if count == 0 {
            return 0;
        }

        tracing::debug!("Created {} {:?} annotation(s)", count, kind);
        self.annotations.apply(Mutation::AddAnnotations(created));
        self.mode.selection_committed();
        self.document_changed();
        count
    }

    /// Pointer pressed; dismisses the popup when outside its bounds
    pub fn pointer_down(&mut self, point: Point) -> bool {
        self.popup.pointer_down(point)
    }

    /// Click on an annotation: open its note editor
    pub fn open_popup(&mut self, annotation_id: &str, anchor: ScreenRect) -> bool {
        if !self.mode.hit_targets_active() {
            return false;
        }
        self.popup.open(&self.annotations, annotation_id, anchor)
    }

    pub fn set_note_draft(&mut self, text: impl Into<String>) {
        self.popup.set_draft(text);
    }

    /// Save the popup draft as the note and close the popup
    pub fn commit_popup(&mut self) -> bool {
        self.dispatch(Command::CommitPopup)
    }

    /// Delete the annotation shown in the popup
    pub fn delete_from_popup(&mut self) -> bool {
        self.dispatch(Command::DeleteFromPopup)
    }

    /// Save the annotations now.
    ///
    /// A pending autosave is left alone; whichever response lands last wins.
    pub async fn save(&mut self) -> Result<(), SessionError> {
        let patch = DocumentPatch::annotations(self.annotations.annotations().to_vec());
        match self.store.save(&self.document.id, &patch).await {
            Ok(_) => {
                tracing::info!("Saved document {}", self.document.id);
                self.dirty = false;
                self.status = Some(StatusMessage::Saved);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to save document {}: {}", self.document.id, e);
                self.status = Some(StatusMessage::SaveFailed(e.to_string()));
                Err(SessionError::Save(e))
            }
        }
    }

    /// Refetch the document from the store.
    ///
    /// Local edits that were not saved yet are discarded along with the undo
    /// history. The reload itself does not trigger an autosave.
    pub async fn reload(&mut self) -> Result<(), SessionError> {
        let mut document = self.store.load(&self.document.id).await.map_err(|e| {
            tracing::warn!("Failed to reload document {}: {}", self.document.id, e);
            SessionError::Load(e)
        })?;

        self.autosave.cancel();
        self.popup.close();
        self.annotations
            .replace_all(std::mem::take(&mut document.annotations));
        self.document = document;
        self.dirty = false;

        self.autosave.skip_next();
        self.document_changed();

        tracing::info!(
            "Reloaded document {} with {} annotations",
            self.document.id,
            self.annotations.len()
        );
        Ok(())
    }

    /// Drain timer events, applying autosave results to the session status.
    ///
    /// Returned events let the view react, e.g. to scroll restores.
    pub fn poll_events(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(&event);
            events.push(event);
        }
        events
    }

    /// Wait for the next timer event
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        let event = self.events_rx.recv().await?;
        self.handle_event(&event);
        Some(event)
    }

    /// Remember the current scroll position
    pub fn record_scroll(&self, top: f64, scroll_height: f64, viewport_height: f64) {
        if let Some(memory) = &self.scroll {
            memory.save(
                &self.document.id,
                ScrollRecord::capture(top, scroll_height, viewport_height),
            );
        }
    }

    /// Saved scroll position, if any
    pub fn saved_scroll(&self) -> Option<ScrollRecord> {
        self.scroll.as_ref()?.load(&self.document.id)
    }

    /// Offset to scroll to for the current layout, if a position was saved
    pub fn restore_scroll(&self, scroll_height: f64, viewport_height: f64) -> Option<f64> {
        self.saved_scroll()
            .map(|record| record.target_offset(scroll_height, viewport_height))
    }

    /// Tear down: cancel every pending timer
    pub fn close(mut self) {
        self.autosave.cancel();
        self.scroll_restores.clear();
        tracing::debug!("Closed session for {}", self.document.id);
    }

    fn handle_event(&mut self, event: &SessionEvent) {
        if let SessionEvent::AutosaveFinished { generation, result } = event {
            match result {
                Ok(()) => {
                    // An older save landing says nothing about newer edits
                    if *generation == self.autosave.generation() {
                        self.dirty = false;
                    }
                }
                Err(e) => {
                    tracing::warn!("Autosave of {} failed: {}", self.document.id, e);
                    self.status = Some(StatusMessage::AutosaveFailed(e.clone()));
                }
            }
        }
    }

    fn document_changed(&mut self) {
        let scheduled = self.autosave.changed(
            Arc::clone(&self.store),
            &self.document.id,
            DocumentPatch::annotations(self.annotations.annotations().to_vec()),
            self.events_tx.clone(),
        );
        if scheduled {
            self.dirty = true;
        }
    }

    /// Restore once now and once after a delay, for late layout shifts
    fn schedule_scroll_restore(&mut self) {
        let Some(record) = self.saved_scroll() else {
            return;
        };

        for delay in [Duration::ZERO, self.config.scroll_restore_retry] {
            let events = self.events_tx.clone();
            self.scroll_restores.push(DeferredTask::spawn(delay, async move {
                let _ = events.send(SessionEvent::RestoreScroll(record));
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::annotations::{AnnotationType, Rect};

    /// In-memory store counting saves
    #[derive(Default)]
    struct MemoryStore {
        docs: Mutex<HashMap<String, Document>>,
        saves: AtomicUsize,
        completed_saves: AtomicUsize,
        fail_saves: AtomicBool,
        save_latency_ms: AtomicU64,
    }

    impl MemoryStore {
        fn with_document(doc: Document) -> Arc<Self> {
            let store = Self::default();
            store.docs.lock().unwrap().insert(doc.id.clone(), doc);
            Arc::new(store)
        }

        fn stored(&self, id: &str) -> Document {
            self.docs.lock().unwrap().get(id).cloned().unwrap()
        }
    }

    #[async_trait]
    impl DocumentStore for MemoryStore {
        async fn load(&self, id: &str) -> Result<Document, StoreError> {
            self.docs
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(id.to_string()))
        }

        async fn save(&self, id: &str, patch: &DocumentPatch) -> Result<Document, StoreError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            let latency = self.save_latency_ms.load(Ordering::SeqCst);
            if latency > 0 {
                tokio::time::sleep(Duration::from_millis(latency)).await;
            }
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(StoreError::Status(500));
            }
            let mut docs = self.docs.lock().unwrap();
            let doc = docs
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            patch.clone().apply_to(doc);
            self.completed_saves.fetch_add(1, Ordering::SeqCst);
            Ok(doc.clone())
        }
    }

    fn document(annotations: Vec<Annotation>) -> Document {
        Document {
            id: "doc-1".to_string(),
            title: "Paper".to_string(),
            author: None,
            journal: None,
            path: "/uploads/doc-1.pdf".to_string(),
            annotations,
            uploaded_at: None,
        }
    }

    fn page() -> Vec<PageLayout> {
        vec![PageLayout::new(0, ScreenRect::new(0.0, 0.0, 200.0, 1000.0))]
    }

    fn selection() -> SelectionSnapshot {
        SelectionSnapshot::new(vec![ScreenRect::new(10.0, 10.0, 50.0, 5.0)])
    }

    async fn open(store: Arc<MemoryStore>) -> ViewSession {
        ViewSession::open(store, "doc-1", SessionConfig::default())
            .await
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_does_not_autosave() {
        let store = MemoryStore::with_document(document(vec![]));
        let session = open(store.clone()).await;

        assert!(!session.is_dirty());
        assert!(!session.autosave_pending());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_load_failure() {
        let store = Arc::new(MemoryStore::default());
        let result = ViewSession::open(store, "missing", SessionConfig::default()).await;
        assert!(matches!(result, Err(SessionError::Load(StoreError::NotFound(_)))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cursor_mode_ignores_selection() {
        let store = MemoryStore::with_document(document(vec![]));
        let mut session = open(store).await;

        assert_eq!(session.pointer_up(&selection(), &page()), 0);
        assert!(session.annotations().is_empty());
        assert!(!session.can_undo());
        assert!(!session.is_dirty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_highlight_then_autosave() {
        let store = MemoryStore::with_document(document(vec![]));
        let mut session = open(store.clone()).await;

        assert!(session.key(KeyInput::plain(Key::Char('h'))));
        assert_eq!(session.pointer_up(&selection(), &page()), 1);
        assert!(session.is_dirty());
        assert!(session.autosave_pending());
        assert_eq!(session.mode(), AnnotationMode::Highlight);

        let event = session.next_event().await.unwrap();
        assert!(matches!(
            event,
            SessionEvent::AutosaveFinished { result: Ok(()), .. }
        ));
        assert!(!session.is_dirty());
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
        assert_eq!(store.stored("doc-1").annotations, session.annotations());
    }

    #[tokio::test(start_paused = true)]
    async fn test_autosave_is_debounced() {
        let store = MemoryStore::with_document(document(vec![]));
        let mut session = open(store.clone()).await;
        session.dispatch(Command::SetMode(AnnotationMode::Underline));

        for _ in 0..3 {
            session.pointer_up(&selection(), &page());
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
        assert_eq!(store.stored("doc-1").annotations.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_keeps_in_flight_save() {
        let store = MemoryStore::with_document(document(vec![]));
        store.save_latency_ms.store(500, Ordering::SeqCst);
        let mut session = open(store.clone()).await;
        session.dispatch(Command::SetMode(AnnotationMode::Highlight));

        session.pointer_up(&selection(), &page());
        // Timer fired at 1s, the save is still running
        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
        assert_eq!(store.completed_saves.load(Ordering::SeqCst), 0);

        session.pointer_up(&selection(), &page());
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(store.saves.load(Ordering::SeqCst), 2);
        assert_eq!(store.completed_saves.load(Ordering::SeqCst), 2);

        let events = session.poll_events();
        assert_eq!(events.len(), 2);
        assert!(!session.is_dirty());
        assert_eq!(store.stored("doc-1").annotations.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_autosave_keeps_dirty() {
        let store = MemoryStore::with_document(document(vec![]));
        store.save_latency_ms.store(500, Ordering::SeqCst);
        let mut session = open(store.clone()).await;
        session.dispatch(Command::SetMode(AnnotationMode::Highlight));

        session.pointer_up(&selection(), &page());
        tokio::time::sleep(Duration::from_millis(1200)).await;
        session.pointer_up(&selection(), &page());

        // The first save lands while the second change is still unsaved
        let event = session.next_event().await.unwrap();
        assert!(matches!(
            event,
            SessionEvent::AutosaveFinished { generation: 1, result: Ok(()) }
        ));
        assert!(session.is_dirty());

        let event = session.next_event().await.unwrap();
        assert!(matches!(
            event,
            SessionEvent::AutosaveFinished { generation: 2, result: Ok(()) }
        ));
        assert!(!session.is_dirty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_autosave_clears_dirty_on_multi_thread_runtime() {
        for _ in 0..50 {
            let store = MemoryStore::with_document(document(vec![]));
            let config = SessionConfig {
                autosave_delay: Duration::from_millis(1),
                ..Default::default()
            };
            let mut session = ViewSession::open(store, "doc-1", config).await.unwrap();
            session.dispatch(Command::SetMode(AnnotationMode::Highlight));
            session.pointer_up(&selection(), &page());

            let event = tokio::time::timeout(Duration::from_secs(5), session.next_event())
                .await
                .unwrap()
                .unwrap();
            assert!(matches!(
                event,
                SessionEvent::AutosaveFinished { result: Ok(()), .. }
            ));
            assert!(!session.is_dirty());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_discards_local_state() {
        let store = MemoryStore::with_document(document(vec![]));
        let mut session = open(store.clone()).await;
        session.dispatch(Command::SetMode(AnnotationMode::Highlight));
        session.pointer_up(&selection(), &page());
        assert!(session.is_dirty());

        let remote = vec![
            Annotation::new(AnnotationType::Underline, 1, vec![Rect::new(1.0, 1.0, 5.0, 1.0)]),
            Annotation::new(AnnotationType::Highlight, 2, vec![Rect::new(2.0, 2.0, 5.0, 1.0)]),
        ];
        store
            .docs
            .lock()
            .unwrap()
            .insert("doc-1".to_string(), document(remote.clone()));

        session.reload().await.unwrap();
        assert_eq!(session.annotations(), remote.as_slice());
        assert!(!session.can_undo());
        assert!(!session.is_dirty());
        assert!(!session.autosave_pending());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);

        // Edits after a reload are saved as usual
        session.pointer_up(&selection(), &page());
        assert!(session.autosave_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_revert_policy() {
        let store = MemoryStore::with_document(document(vec![]));
        let config = SessionConfig {
            mode_policy: ModePolicy::RevertToCursor,
            ..Default::default()
        };
        let mut session = ViewSession::open(store, "doc-1", config).await.unwrap();

        session.dispatch(Command::SetMode(AnnotationMode::Highlight));
        // Nothing selected: mode is kept
        session.pointer_up(&SelectionSnapshot::collapsed(), &page());
        assert_eq!(session.mode(), AnnotationMode::Highlight);

        session.pointer_up(&selection(), &page());
        assert_eq!(session.mode(), AnnotationMode::Cursor);
    }

    #[tokio::test(start_paused = true)]
    async fn test_popup_flow_and_undo() {
        let annotation = Annotation::new(
            AnnotationType::Highlight,
            0,
            vec![Rect::new(5.0, 1.0, 25.0, 0.5)],
        );
        let id = annotation.id.clone();
        let store = MemoryStore::with_document(document(vec![annotation]));
        let mut session = open(store).await;
        let anchor = ScreenRect::new(10.0, 10.0, 50.0, 5.0);

        // Hit targets are off while highlighting
        session.dispatch(Command::SetMode(AnnotationMode::Highlight));
        assert!(!session.open_popup(&id, anchor));
        session.dispatch(Command::SetMode(AnnotationMode::Cursor));

        assert!(session.open_popup(&id, anchor));
        session.set_note_draft("  ");
        assert!(!session.dispatch(Command::CommitPopup));
        assert!(!session.can_undo());

        session.open_popup(&id, anchor);
        session.set_note_draft("important");
        assert!(session.commit_popup());
        assert_eq!(session.annotations()[0].note.as_deref(), Some("important"));

        session.open_popup(&id, anchor);
        session.set_note_draft("typed but dropped");
        assert!(session.key(KeyInput::plain(Key::Escape).in_text_input()));
        assert!(!session.popup().is_open());
        assert_eq!(session.annotations()[0].note.as_deref(), Some("important"));

        session.open_popup(&id, anchor);
        assert!(session.delete_from_popup());
        assert!(session.annotations().is_empty());

        assert!(session.key(KeyInput::plain(Key::Char('z')).with_meta()));
        assert_eq!(session.annotations()[0].note.as_deref(), Some("important"));
        assert!(session.key(KeyInput::plain(Key::Char('z')).with_ctrl()));
        assert!(session.annotations()[0].note.is_none());
        assert!(!session.dispatch(Command::Undo));
    }

    #[tokio::test(start_paused = true)]
    async fn test_undo_closes_orphaned_popup() {
        let store = MemoryStore::with_document(document(vec![]));
        let mut session = open(store).await;

        session.dispatch(Command::SetMode(AnnotationMode::Highlight));
        session.pointer_up(&selection(), &page());
        session.dispatch(Command::SetMode(AnnotationMode::Cursor));
        let id = session.annotations()[0].id.clone();

        session.open_popup(&id, ScreenRect::new(0.0, 0.0, 10.0, 10.0));
        assert!(session.popup().is_open());
        assert!(session.dispatch(Command::Undo));
        assert!(!session.popup().is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_save_failure_keeps_dirty() {
        let store = MemoryStore::with_document(document(vec![]));
        let mut session = open(store.clone()).await;
        session.dispatch(Command::SetMode(AnnotationMode::Highlight));
        session.pointer_up(&selection(), &page());

        store.fail_saves.store(true, Ordering::SeqCst);
        assert!(matches!(session.save().await, Err(SessionError::Save(_))));
        assert!(session.is_dirty());
        assert!(matches!(session.status(), Some(StatusMessage::SaveFailed(_))));

        store.fail_saves.store(false, Ordering::SeqCst);
        session.save().await.unwrap();
        assert_eq!(session.status(), Some(&StatusMessage::Saved));
    }

    #[tokio::test(start_paused = true)]
    async fn test_autosave_failure_sets_status() {
        let store = MemoryStore::with_document(document(vec![]));
        store.fail_saves.store(true, Ordering::SeqCst);
        let mut session = open(store).await;
        session.dispatch(Command::SetMode(AnnotationMode::Highlight));
        session.pointer_up(&selection(), &page());

        let event = session.next_event().await.unwrap();
        assert!(matches!(
            event,
            SessionEvent::AutosaveFinished { result: Err(_), .. }
        ));
        assert!(matches!(session.status(), Some(StatusMessage::AutosaveFailed(_))));
        assert!(session.is_dirty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_autosave() {
        let store = MemoryStore::with_document(document(vec![]));
        let mut session = open(store.clone()).await;
        session.dispatch(Command::SetMode(AnnotationMode::Highlight));
        session.pointer_up(&selection(), &page());

        session.close();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scroll_restore_twice() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let scroll_file = temp_dir.path().join("scroll.json");
        ScrollMemory::new(&scroll_file).save("doc-1", ScrollRecord::capture(300.0, 1300.0, 300.0));

        let store = MemoryStore::with_document(document(vec![]));
        let config = SessionConfig {
            scroll_file: Some(scroll_file),
            ..Default::default()
        };
        let mut session = ViewSession::open(store, "doc-1", config).await.unwrap();

        let first = session.next_event().await.unwrap();
        let second = session.next_event().await.unwrap();
        for event in [first, second] {
            match event {
                SessionEvent::RestoreScroll(record) => assert_eq!(record.top, 300.0),
                other => panic!("unexpected event {:?}", other),
            }
        }

        // Ratio 0.3 of the scrollable range, after the layout doubled
        let offset = session.restore_scroll(2300.0, 300.0).unwrap();
        assert!((offset - 600.0).abs() < 1e-9);

        session.record_scroll(0.0, 2300.0, 300.0);
        assert_eq!(session.restore_scroll(2300.0, 300.0), Some(0.0));
    }
}
