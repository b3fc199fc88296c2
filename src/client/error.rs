//! Client error types

use thiserror::Error;

use crate::shared::ConfigError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("socket transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with `success: false` or a non-2xx status
    #[error("request failed ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("no session token")]
    MissingToken,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type ClientResult<T> = Result<T, ClientError>;
