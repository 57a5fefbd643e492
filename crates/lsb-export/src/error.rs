use lsb_document::DocumentError;
use lsb_perms::PermsError;
use lsb_runtime::RuntimeError;
use thiserror::Error;

/// Reasons an export ends in FAILED.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing is selected")]
    NothingSelected,

    #[error("export refused: {0}")]
    Permission(#[from] PermsError),

    #[error("document could not be written: {0}")]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

pub type ExportResult<T> = Result<T, ExportError>;
