/// Result alias that carries the custom [`SlideshowError`] type.
pub type Result<T> = std::result::Result<T, SlideshowError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum SlideshowError {
    /// Rejected configuration: empty asset sequences, non-positive tempo or
    /// negative beat counts. Raised before any timeline is built.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// A snapshot that cannot describe a reachable timeline state.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl SlideshowError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_snapshot<T: Into<String>>(msg: T) -> Self {
        Self::InvalidSnapshot(msg.into())
    }
}
