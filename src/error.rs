use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid scoring weights: {0}")]
    InvalidWeights(String),

    #[error("Invalid counter relation: {0}")]
    InvalidCounter(String),

    #[error("Invalid meta entry: {0}")]
    InvalidMeta(String),

    #[error("Invalid match record: {0}")]
    InvalidMatch(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
