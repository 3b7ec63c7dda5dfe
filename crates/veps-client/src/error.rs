use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status} from {endpoint}")]
    UnexpectedStatus { endpoint: String, status: u16 },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("token source error: {0}")]
    Token(String),
}

pub type ClientResult<T> = Result<T, ClientError>;
