//! Backup document format for the linkset backup engine.
//!
//! A backup is a pretty-printed JSON document plus one companion image per
//! exported texture, stored next to the document and named by asset id.
//!
//! # Key Types
//!
//! - [`BackupDocument`] -- format header, [`DocumentMetadata`] and linksets
//! - [`BackupStore`] -- document and companion image storage
//! - [`BackupDir`] -- on-disk store
//! - [`MemoryBackup`] -- in-memory store with write fault injection

pub mod document;
pub mod error;
pub mod store;
mod wire;

pub use document::{BackupDocument, DocumentMetadata, FORMAT_TAG, FORMAT_VERSION};
pub use error::{DocumentError, DocumentResult};
pub use store::{BackupDir, BackupStore, MemoryBackup};
