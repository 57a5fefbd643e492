use lsb_types::{AssetId, TypeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unknown document format: expected {expected}, got {actual}")]
    UnknownFormat { expected: String, actual: String },

    #[error("unsupported document version: {0}")]
    UnsupportedVersion(u32),

    #[error("document holds no linksets")]
    NoLinksets,

    #[error("linkset {index} is invalid: {source}")]
    InvalidLinkset {
        index: usize,
        #[source]
        source: TypeError,
    },

    #[error("companion image for {0} not found")]
    CompanionMissing(AssetId),

    #[error("write rejected: {0}")]
    WriteRejected(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DocumentResult<T> = Result<T, DocumentError>;
