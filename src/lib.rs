//! PDF-Pile Library
//!
//! Upload PDFs, view them in the browser and annotate them with highlights,
//! underlines and notes.
//!
//! # Modules
//!
//! - `annotations`: annotation types, selection geometry, store with undo
//! - `session`: client view session (modes, note popup, autosave, scroll memory)
//! - `library`: JSON file document store used by the server
//! - `routes`: HTTP API of the document store

pub mod annotations;
pub mod config;
pub mod error;
pub mod library;
pub mod routes;
pub mod session;
pub mod state;
