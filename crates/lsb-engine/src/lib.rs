//! Linkset backup client.
//!
//! Exports a selection of linksets to a portable backup (a JSON document plus
//! companion JPEG-2000 images) and rebuilds backups in front of the operator.
//!
//! # Key Types
//!
//! - [`BackupClient`] -- owns the world, the sessions and the event queue
//! - [`BackupConfig`] -- TOML-loadable settings
//!
//! # Example
//!
//! ```ignore
//! let mut client = BackupClient::new(world, BackupConfig::default(), Box::new(TracingProgress));
//! client.start_export(Box::new(BackupDir::new("backup/table.json")));
//! client.run_until_idle().await;
//! ```

pub mod client;
pub mod config;
pub mod error;

pub use client::{BackupClient, World};
pub use config::BackupConfig;
pub use error::{EngineError, EngineResult};
