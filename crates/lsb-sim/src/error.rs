use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid scene: {0}")]
    Scene(#[from] serde_json::Error),

    #[error("scene could not be read: {0}")]
    Io(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimError>;
