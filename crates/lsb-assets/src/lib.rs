//! Texture transfer for the linkset backup engine.
//!
//! Exports pull images out of the local texture cache; imports push the
//! companion images of a backup into the destination world's asset store and
//! remember the id each one received.
//!
//! # Key Types
//!
//! - [`TextureCacheReader`] -- one cache read at a time, JPEG-2000 only
//! - [`Reuploader`] -- one upload at a time, failures skipped
//! - [`AssetIdRemap`] -- add-only source-to-destination id table
//! - [`InMemoryAssetStore`] -- content-addressed store for simulated worlds

pub mod cache;
pub mod error;
pub mod remap;
pub mod reupload;
pub mod store;

pub use cache::{classify, TextureCacheReader, TextureFetch};
pub use error::{AssetError, AssetResult};
pub use remap::AssetIdRemap;
pub use reupload::Reuploader;
pub use store::{content_id, InMemoryAssetStore};
