use lsb_types::AssetId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    /// A remap entry may be set once per session.
    #[error("asset {original} is already mapped to {existing}, refusing {proposed}")]
    RemapConflict {
        original: AssetId,
        existing: AssetId,
        proposed: AssetId,
    },

    #[error("refusing to store an empty asset")]
    EmptyAsset,

    #[error("asset {0} not found")]
    NotFound(AssetId),
}

pub type AssetResult<T> = Result<T, AssetError>;
