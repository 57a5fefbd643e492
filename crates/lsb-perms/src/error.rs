use lsb_types::{AssetId, LocalId};

/// Reasons an export is refused outright.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermsError {
    /// The actor may not export this primitive.
    #[error("no export permission for primitive {0}")]
    PrimDenied(LocalId),

    /// The primitive is a mesh, which cannot be exported.
    #[error("primitive {0} is a mesh object")]
    MeshNotExportable(LocalId),

    /// The sculpt map of a sculpted primitive failed the texture gate.
    #[error("no export permission for sculpt map {texture} of primitive {prim}")]
    SculptDenied { prim: LocalId, texture: AssetId },
}

pub type PermsResult<T> = Result<T, PermsError>;
