use thiserror::Error;

use crate::identity::LocalId;

/// Errors produced by type operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identifier '{value}': {reason}")]
    InvalidId { value: String, reason: String },

    #[error("linkset has no primitives")]
    EmptyLinkset,

    #[error("first primitive {0} is not a root (it has a parent)")]
    RootNotFirst(LocalId),

    #[error("linkset has more than one root: {0} and {1}")]
    MultipleRoots(LocalId, LocalId),

    #[error("duplicate local id {0} in linkset")]
    DuplicateLocalId(LocalId),

    #[error("primitive {child} references unknown parent {parent}")]
    DanglingParent { child: LocalId, parent: LocalId },
}
