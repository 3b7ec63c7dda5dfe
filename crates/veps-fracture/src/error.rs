use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("invalid date: {0}")]
    InvalidDate(String),
}

pub type ArchiveResult<T> = Result<T, ArchiveError>;
