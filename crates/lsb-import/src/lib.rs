//! Linkset import for the linkset backup engine.
//!
//! An import reads a backup document, optionally uploads its companion
//! images, then rebuilds every linkset in front of the operator: placeholders
//! are created one by one, given their recorded attributes, linked, and the
//! root's rotation restored.
//!
//! # Key Types
//!
//! - [`RezSequencer`] -- placeholder creation, matched by arrival order
//! - [`AttributeApplier`] -- one attribute update per placeholder
//! - [`LinksetAssembler`] -- link plus root rotation fix-up
//! - [`ImportSession`] -- the import state machine

pub mod apply;
pub mod assemble;
pub mod error;
pub mod placement;
pub mod rez;
pub mod session;

pub use apply::{attributes_for, AttributeApplier};
pub use assemble::{AssemblyStep, LinksetAssembler};
pub use error::{ImportError, ImportResult};
pub use placement::{root_placement, Placement, PlacementOptions};
pub use rez::RezSequencer;
pub use session::{ImportOptions, ImportSession, ImportWorld};
