//! Annotation and document types
//!
//! These types are shared between the document store (server) and the
//! view session (client) and define the JSON wire format of `/api/pdfs`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tolerance used when checking percentage bounds
pub const PERCENT_EPSILON: f64 = 1e-6;

/// A rectangle in page-relative percentages (0-100)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the rect lies inside the page box and has a positive area
    pub fn is_normalized(&self) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.x >= -PERCENT_EPSILON
            && self.y >= -PERCENT_EPSILON
            && self.x + self.width <= 100.0 + PERCENT_EPSILON
            && self.y + self.height <= 100.0 + PERCENT_EPSILON
    }
}

/// Types of annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    /// Text highlight
    Highlight,
    /// Underline
    Underline,
}

/// A highlight or underline on a single page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Unique identifier (UUID)
    pub id: String,
    /// Type of annotation
    #[serde(rename = "type")]
    pub annotation_type: AnnotationType,
    /// Zero-based page the rects belong to
    #[serde(rename = "pageIndex")]
    pub page_index: u32,
    /// One rect per selected line fragment, top to bottom
    pub rects: Vec<Rect>,
    /// Free-text note. `None` means no note, never an empty string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Annotation {
    /// Create an annotation with a freshly generated id
    pub fn new(annotation_type: AnnotationType, page_index: u32, rects: Vec<Rect>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            annotation_type,
            page_index,
            rects,
            note: None,
        }
    }

    /// Attach a note
    pub fn with_note(mut self, note: &str) -> Self {
        self.note = normalize_note(Some(note));
        self
    }
}

/// Trim a note and map blank input to "no note"
pub fn normalize_note(note: Option<&str>) -> Option<String> {
    note.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

/// A stored PDF and its annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
    /// Public path the PDF is served from, e.g. `/uploads/<file>.pdf`
    pub path: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Entry of the document list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            title: doc.title.clone(),
            author: doc.author.clone(),
        }
    }
}

/// Partial update of a document; omitted fields are preserved
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Vec<Annotation>>,
}

impl DocumentPatch {
    /// Patch carrying only the annotation list
    pub fn annotations(annotations: Vec<Annotation>) -> Self {
        Self {
            annotations: Some(annotations),
            ..Default::default()
        }
    }

    /// Merge the provided fields over `doc`
    pub fn apply_to(self, doc: &mut Document) {
        if let Some(title) = self.title {
            doc.title = title;
        }
        if let Some(author) = self.author {
            doc.author = Some(author);
        }
        if let Some(journal) = self.journal {
            doc.journal = Some(journal);
        }
        if let Some(annotations) = self.annotations {
            doc.annotations = annotations;
        }
    }
}
