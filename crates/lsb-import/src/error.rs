use lsb_document::DocumentError;
use lsb_runtime::RuntimeError;
use thiserror::Error;

/// Reasons an import ends in FAILED.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("backup could not be read: {0}")]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("linkset {linkset} has no root object")]
    NoRoot { linkset: usize },
}

pub type ImportResult<T> = Result<T, ImportError>;
