use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("config could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
