//! Flat JSON file storage for documents
//!
//! Metadata and annotations of every document live in one `pdfs.json`;
//! PDFs are written next to it in the uploads directory. Every mutation
//! rewrites the whole file and only takes effect in memory once that write
//! succeeded. Concurrent writers are serialized by the lock, so the last
//! write wins.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::annotations::{Document, DocumentPatch, DocumentSummary};
use crate::config::StorageConfig;

/// Public URL prefix of stored PDFs
pub const UPLOADS_PREFIX: &str = "/uploads";

/// Errors from the document library
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("Not a PDF file: {0}")]
    NotPdf(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt document index: {0}")]
    Json(#[from] serde_json::Error),
}

/// A PDF received by the upload endpoint
#[derive(Debug, Clone, Default)]
pub struct NewUpload {
    /// Original file name as sent by the client
    pub filename: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub journal: Option<String>,
    pub data: Vec<u8>,
}

/// Shared handle to the document library
#[derive(Clone)]
pub struct DocumentLibrary {
    inner: Arc<LibraryInner>,
}

struct LibraryInner {
    db_path: PathBuf,
    upload_dir: PathBuf,
    documents: RwLock<Vec<Document>>,
}

impl DocumentLibrary {
    /// Open the library, creating its directories if needed
    pub async fn open(config: &StorageConfig) -> Result<Self, LibraryError> {
        tokio::fs::create_dir_all(&config.data_dir).await?;
        tokio::fs::create_dir_all(&config.upload_dir).await?;

        let db_path = config.db_path();
        let documents = match tokio::fs::read(&db_path).await {
            Ok(bytes) => serde_json::from_slice::<Vec<Document>>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::info!("Loaded {} documents from {:?}", documents.len(), db_path);

        Ok(Self {
            inner: Arc::new(LibraryInner {
                db_path,
                upload_dir: config.upload_dir.clone(),
                documents: RwLock::new(documents),
            }),
        })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.inner.upload_dir
    }

    /// Summaries of all documents, in upload order
    pub async fn list(&self) -> Vec<DocumentSummary> {
        self.inner
            .documents
            .read()
            .await
            .iter()
            .map(DocumentSummary::from)
            .collect()
    }

    pub async fn count(&self) -> usize {
        self.inner.documents.read().await.len()
    }

    pub async fn get(&self, id: &str) -> Option<Document> {
        self.inner
            .documents
            .read()
            .await
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    /// Merge `patch` over a document. Returns `None` if it does not exist.
    pub async fn update(
        &self,
        id: &str,
        patch: DocumentPatch,
    ) -> Result<Option<Document>, LibraryError> {
        let mut documents = self.inner.documents.write().await;
        let Some(index) = documents.iter().position(|d| d.id == id) else {
            return Ok(None);
        };

        let mut next = documents.clone();
        patch.apply_to(&mut next[index]);
        let updated = next[index].clone();
        self.persist(&next).await?;
        *documents = next;

        tracing::debug!(
            "Updated document {} ({} annotations)",
            id,
            updated.annotations.len()
        );
        Ok(Some(updated))
    }

    /// Store an uploaded PDF and create its record
    pub async fn create(&self, upload: NewUpload) -> Result<Document, LibraryError> {
        if !upload.data.starts_with(b"%PDF-") {
            return Err(LibraryError::NotPdf(upload.filename));
        }

        let id = Uuid::new_v4().to_string();
        let file_name = format!("{}.pdf", id);
        tokio::fs::write(self.inner.upload_dir.join(&file_name), &upload.data).await?;

        let title = upload
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| title_from_filename(&upload.filename));

        let document = Document {
            id,
            title,
            author: upload.author.filter(|a| !a.trim().is_empty()),
            journal: upload.journal.filter(|j| !j.trim().is_empty()),
            path: format!("{}/{}", UPLOADS_PREFIX, file_name),
            annotations: Vec::new(),
            uploaded_at: Some(Utc::now()),
        };

        let mut documents = self.inner.documents.write().await;
        let mut next = documents.clone();
        next.push(document.clone());
        if let Err(e) = self.persist(&next).await {
            let file = self.inner.upload_dir.join(&file_name);
            if let Err(remove_err) = tokio::fs::remove_file(&file).await {
                tracing::warn!("Failed to remove orphaned upload {:?}: {}", file, remove_err);
            }
            return Err(e);
        }
        *documents = next;

        tracing::info!(
            "Stored '{}' as {} ({} bytes)",
            upload.filename,
            document.id,
            upload.data.len()
        );
        Ok(document)
    }

    /// Remove a document and its file. Returns false if it does not exist.
    pub async fn delete(&self, id: &str) -> Result<bool, LibraryError> {
        let mut documents = self.inner.documents.write().await;
        let Some(index) = documents.iter().position(|d| d.id == id) else {
            return Ok(false);
        };

        let mut next = documents.clone();
        let removed = next.remove(index);
        self.persist(&next).await?;
        *documents = next;
        drop(documents);

        if let Some(path) = self.resolve_public_path(&removed.path) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::warn!("File for document {} was already gone: {:?}", id, path);
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::info!("Deleted document {}", id);
        Ok(true)
    }

    /// Resolve a file name below the uploads directory.
    ///
    /// Rejects anything that is not a plain relative path.
    pub fn resolve_file(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name);
        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if name.is_empty() || !plain {
            return None;
        }
        Some(self.inner.upload_dir.join(relative))
    }

    /// Map a document `path` (`/uploads/<file>`) to its location on disk
    fn resolve_public_path(&self, public_path: &str) -> Option<PathBuf> {
        let name = public_path
            .strip_prefix(UPLOADS_PREFIX)?
            .trim_start_matches('/');
        self.resolve_file(name)
    }

    async fn persist(&self, documents: &[Document]) -> Result<(), LibraryError> {
        let json = serde_json::to_vec_pretty(documents)?;
        let tmp_path = self.inner.db_path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &self.inner.db_path).await?;
        Ok(())
    }
}

/// "My Paper.pdf" -> "My Paper"
fn title_from_filename(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let stem = match name.rsplit_once('.') {
        Some((stem, ext)) if ext.eq_ignore_ascii_case("pdf") && !stem.is_empty() => stem,
        _ => name,
    };
    if stem.trim().is_empty() {
        "Untitled".to_string()
    } else {
        stem.to_string()
    }
}
