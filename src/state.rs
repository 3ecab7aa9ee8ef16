//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::library::{DocumentLibrary, LibraryError};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    library: DocumentLibrary,
}

impl AppState {
    /// Create the application state, opening the document library
    pub async fn new(config: Config) -> Result<Self, LibraryError> {
        let library = DocumentLibrary::open(&config.storage).await?;

        Ok(Self {
            inner: Arc::new(AppStateInner { config, library }),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the document library
    pub fn library(&self) -> &DocumentLibrary {
        &self.inner.library
    }
}
