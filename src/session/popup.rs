//! Note editor popup for a single annotation

use crate::annotations::{AnnotationStore, Mutation, ScreenRect};

/// Popup width in CSS pixels
const POPUP_WIDTH: f64 = 280.0;

/// Popup height in CSS pixels
const POPUP_HEIGHT: f64 = 160.0;

/// Gap between the annotation and the popup
const ANCHOR_OFFSET: f64 = 8.0;

/// A point in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Editor state for the note of the active annotation
#[derive(Debug, Clone, Default)]
pub struct PopupController {
    active: Option<String>,
    draft: String,
    anchor: Option<Point>,
}

impl PopupController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the editor for `id`, anchored below `anchor_rect`.
    ///
    /// Returns false if the annotation does not exist.
    pub fn open(&mut self, store: &AnnotationStore, id: &str, anchor_rect: ScreenRect) -> bool {
        let Some(annotation) = store.get(id) else {
            return false;
        };

        self.active = Some(annotation.id.clone());
        self.draft = annotation.note.clone().unwrap_or_default();
        self.anchor = Some(Point::new(
            anchor_rect.left + anchor_rect.width / 2.0,
            anchor_rect.bottom() + ANCHOR_OFFSET,
        ));
        true
    }

    /// Discard the draft and hide the popup
    pub fn close(&mut self) {
        self.active = None;
        self.draft.clear();
        self.anchor = None;
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        if self.is_open() {
            self.draft = text.into();
        }
    }

    pub fn anchor(&self) -> Option<Point> {
        self.anchor
    }

    /// Caret position for the focused note field: end of the draft
    pub fn caret(&self) -> Option<usize> {
        self.active.as_ref().map(|_| self.draft.chars().count())
    }

    /// Save the draft as the annotation's note and close.
    ///
    /// Returns true if the note changed.
    pub fn commit(&mut self, store: &mut AnnotationStore) -> bool {
        let changed = match self.active.take() {
            Some(id) => store.apply(Mutation::SetNote {
                id,
                note: Some(self.draft.trim().to_string()),
            }),
            None => false,
        };
        self.close();
        changed
    }

    /// Delete the active annotation and close
    pub fn delete(&mut self, store: &mut AnnotationStore) -> bool {
        let deleted = match self.active.take() {
            Some(id) => store.apply(Mutation::Delete { id }),
            None => false,
        };
        self.close();
        deleted
    }

    /// Screen bounds of the popup: centered on the anchor, hanging below it
    pub fn bounds(&self) -> Option<ScreenRect> {
        self.anchor.map(|anchor| {
            ScreenRect::new(
                anchor.x - POPUP_WIDTH / 2.0,
                anchor.y,
                POPUP_WIDTH,
                POPUP_HEIGHT,
            )
        })
    }

    /// Close without committing when the pointer goes down outside the popup.
    ///
    /// Returns true if the popup was dismissed.
    pub fn pointer_down(&mut self, point: Point) -> bool {
        match self.bounds() {
            Some(bounds) if !bounds.contains(point.x, point.y) => {
                self.close();
                true
            }
            _ => false,
        }
    }
}
