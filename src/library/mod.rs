//! Document library
//!
//! Server-side store behind `/api/pdfs`: a JSON index of documents and
//! their annotations plus the uploaded PDF files.

mod store;

pub use store::{DocumentLibrary, LibraryError, NewUpload, UPLOADS_PREFIX};
