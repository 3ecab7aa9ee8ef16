//! Document store client
//!
//! The session only talks to the store through [`DocumentStore`], so tests
//! can swap in an in-memory implementation.

use async_trait::async_trait;

use crate::annotations::{Document, DocumentPatch};

/// Errors from the document store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Document store returned status {0}")]
    Status(u16),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Load/save contract of the document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document with its annotations
    async fn load(&self, id: &str) -> Result<Document, StoreError>;

    /// Merge `patch` over the stored document and return the result
    async fn save(&self, id: &str, patch: &DocumentPatch) -> Result<Document, StoreError>;
}

/// HTTP client for the `/api/pdfs` endpoints
#[derive(Clone)]
pub struct HttpDocumentStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDocumentStore {
    /// Create a client for a server at `base_url`, e.g. `http://localhost:3001`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn document_url(&self, id: &str) -> String {
        format!("{}/api/pdfs/{}", self.base_url, id)
    }

    async fn read_document(id: &str, response: reqwest::Response) -> Result<Document, StoreError> {
        match response.status() {
            status if status.is_success() => Ok(response.json::<Document>().await?),
            reqwest::StatusCode::NOT_FOUND => Err(StoreError::NotFound(id.to_string())),
            status => Err(StoreError::Status(status.as_u16())),
        }
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn load(&self, id: &str) -> Result<Document, StoreError> {
        tracing::debug!("GET {}", self.document_url(id));
        let response = self.client.get(self.document_url(id)).send().await?;
        Self::read_document(id, response).await
    }

    async fn save(&self, id: &str, patch: &DocumentPatch) -> Result<Document, StoreError> {
        tracing::debug!("PUT {}", self.document_url(id));
        let response = self
            .client
            .put(self.document_url(id))
            .json(patch)
            .send()
            .await?;
        Self::read_document(id, response).await
    }
}
