use thiserror::Error;

/// Invocation-level failures. Anything in here aborts the whole batch; per-record
/// problems are reported through [`crate::forwarder::RecordError`] instead.
#[derive(Debug, Error)]
pub enum Error {
    /// No usable signing identity could be resolved.
    #[error("credentials unavailable: {0}")]
    Credentials(String),

    /// Target region, endpoint, index or document type is missing or malformed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The incoming stream event could not be parsed.
    #[error("malformed stream event: {0}")]
    Event(#[from] serde_json::Error),

    /// The HTTP client could not be created.
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
