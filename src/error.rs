use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum DozeError {
    #[error("Invalid proximity subtype spec: {0}")]
    InvalidSubtypeSpec(String),

    #[error("Pulse callback failed: {0}")]
    PulseCallbackFailed(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DozeError>;
