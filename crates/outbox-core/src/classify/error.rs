//! Error returned by a single request attempt.

/// Failure of one request attempt, kept typed so it can be classified before
/// being handed back to the caller.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// Curl reported an error (resolve, connect, timeout, reset, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// Socket-level failure outside curl.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    /// The remote answered with a non-2xx status.
    #[error("HTTP {0}")]
    Status(u32),
    /// The request could not be built or the transport task failed.
    #[error("{0}")]
    Other(String),
}
