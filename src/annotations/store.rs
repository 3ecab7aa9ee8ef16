//! In-memory annotation collection with undo
//!
//! All edits go through [`AnnotationStore::apply`], which snapshots the
//! collection before any change so it can be undone.

use super::history::HistoryStack;
use super::types::{normalize_note, Annotation};

/// An edit to the annotation collection
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Append annotations produced by one selection
    AddAnnotations(Vec<Annotation>),
    /// Replace the note of an annotation; blank means no note
    SetNote { id: String, note: Option<String> },
    /// Remove an annotation
    Delete { id: String },
}

/// Ordered annotations of the open document plus their undo history
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
    history: HistoryStack,
}

impl AnnotationStore {
    /// Create a store with the given history capacity
    pub fn new(annotations: Vec<Annotation>, history_limit: usize) -> Self {
        Self {
            annotations,
            history: HistoryStack::new(history_limit),
        }
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn get(&self, id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Apply a mutation. Returns true if the collection changed.
    pub fn apply(&mut self, mutation: Mutation) -> bool {
        match mutation {
            Mutation::AddAnnotations(added) => {
                if added.is_empty() {
                    return false;
                }
                self.history.push(&self.annotations);
                self.annotations.extend(added);
                true
            }
            Mutation::SetNote { id, note } => {
                let note = normalize_note(note.as_deref());
                let Some(index) = self.position(&id) else {
                    tracing::debug!("Ignoring note edit for unknown annotation {}", id);
                    return false;
                };
                if normalize_note(self.annotations[index].note.as_deref()) == note {
                    return false;
                }
                self.history.push(&self.annotations);
                self.annotations[index].note = note;
                true
            }
            Mutation::Delete { id } => {
                let Some(index) = self.position(&id) else {
                    return false;
                };
                self.history.push(&self.annotations);
                self.annotations.remove(index);
                true
            }
        }
    }

    /// Restore the most recent snapshot. Returns false if there was none.
    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(snapshot) => {
                self.annotations = snapshot;
                true
            }
            None => false,
        }
    }

    /// Replace the collection wholesale, e.g. after a reload. Clears history.
    pub fn replace_all(&mut self, annotations: Vec<Annotation>) {
        self.annotations = annotations;
        self.history.clear();
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.annotations.iter().position(|a| a.id == id)
    }
}
