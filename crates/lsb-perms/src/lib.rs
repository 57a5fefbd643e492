//! Export permission checks for the linkset backup engine.
//!
//! Every primitive and every texture leaving the world passes through this
//! crate. The concrete permission system stays outside: it is consumed as a
//! [`PermissionSet`] value per item, plus a [`PermissionSource`] that lists
//! the permission sets of inventory items holding a given asset.
//!
//! # Quick Start
//!
//! ```rust
//! use lsb_perms::{ExportPolicy, ExportPredicate, PermissionSet};
//! use lsb_types::ActorId;
//!
//! let me = ActorId::random();
//! let perms = PermissionSet::full(me, me);
//! assert!(ExportPolicy::CreatorOnly.allows(&perms, me));
//! ```

pub mod config;
pub mod defaults;
pub mod error;
pub mod gate;
pub mod permissions;

pub use config::PermsConfig;
pub use defaults::DefaultTextures;
pub use error::{PermsError, PermsResult};
pub use gate::{PermissionSource, TextureGate};
pub use permissions::{ExportPolicy, ExportPredicate, PermissionMask, PermissionSet};
