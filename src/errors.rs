use thiserror::Error;

/// Failures surfaced by tracker operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Input was malformed or out of range. Nothing was written.
    #[error("{0}")]
    Validation(String),

    /// The store rejected or failed a read or write; open transactions were rolled back.
    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

pub type TrackerResult<T> = Result<T, TrackerError>;

impl TrackerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
