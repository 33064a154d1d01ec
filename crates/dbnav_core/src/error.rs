use thiserror::Error;

#[derive(Debug, Error)]
pub enum NavError {
    #[error("Gateway request failed: {0}")]
    Gateway(String),

    #[error("No active connection")]
    NoConnection,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl NavError {
    pub fn gateway(message: impl Into<String>) -> Self {
        Self::Gateway(message.into())
    }
}
