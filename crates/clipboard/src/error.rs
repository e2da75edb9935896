use thiserror::Error;

/// Why a buffer could not be read. Every variant is treated as transient.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("buffer has no owner")]
    NoOwner,
    #[error("owner did not answer in time")]
    Timeout,
    #[error("owner provided none of the requested formats")]
    Empty,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl ReadError {
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        ReadError::Backend(err.into())
    }
}
