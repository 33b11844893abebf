use thiserror::Error;

/// Top-level error type for the Sextant search service.
///
/// Variants follow the failure taxonomy of the query pipeline: some are fatal
/// to a whole request (`Provider` during embedding or namespace discovery),
/// others are absorbed inside a fan-out branch and only logged.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SextantError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Entity unresolvable: {pi}: {reason}")]
    EntityUnresolvable { pi: String, reason: String },

    #[error("Not initialized: {0}")]
    NotInitialized(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SextantError {
    /// True for errors caused by the caller's input rather than an upstream.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SextantError::InvalidQuery(_) | SextantError::InvalidInput(_)
        )
    }
}

impl From<toml::de::Error> for SextantError {
    fn from(err: toml::de::Error) -> Self {
        SextantError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SextantError {
    fn from(err: toml::ser::Error) -> Self {
        SextantError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SextantError {
    fn from(err: serde_json::Error) -> Self {
        SextantError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Sextant operations.
pub type Result<T> = std::result::Result<T, SextantError>;
