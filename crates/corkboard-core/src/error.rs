use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("move rejected: {0}")]
    Rejected(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("internal error: {0}")]
    Internal(String),
}
