use thiserror::Error;

/// Error taxonomy for the core pipeline. Collaborator failures carry the
/// underlying message; nothing in here is retried automatically.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("frame extraction failed: {0}")]
    Extraction(String),

    #[error("frame indexing failed: {0}")]
    Indexing(String),

    #[error("cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
