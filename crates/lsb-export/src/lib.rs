//! Linkset export for the linkset backup engine.
//!
//! An export captures the operator's selection, checks every primitive
//! against the grid's export policy, writes a backup document and then copies
//! the referenced textures out of the local cache, one read at a time.
//!
//! # Key Types
//!
//! - [`SelectionSource`] / [`SelectedLinkset`] -- what is being exported
//! - [`PrimSerializer`] -- selection to [`LinksetDescriptor`](lsb_types::LinksetDescriptor)
//! - [`ExportSession`] -- the export state machine

pub mod error;
pub mod selection;
pub mod serializer;
pub mod session;

pub use error::{ExportError, ExportResult};
pub use selection::{SelectedLinkset, SelectionSource, WorldPrim};
pub use serializer::PrimSerializer;
pub use session::{ExportOptions, ExportSession, ExportWorld};
