//! Common error types used throughout fileforged.

/// Common error type for fileforged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A format name was not recognized.
    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new UnknownFormat error.
    pub fn unknown_format<S: Into<String>>(name: S) -> Self {
        Self::UnknownFormat(name.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
