use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed or missing configuration. Fatal at load time, before any
    /// fetch or scoring runs.
    #[error("Config error: {0}")]
    Config(String),

    /// A fetcher was unreachable or timed out. Non-fatal: the source is
    /// marked degraded and the run continues with reduced coverage.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// No usable snapshot exists at or before the requested date.
    #[error("No snapshot at or before {0}")]
    NoSnapshot(String),

    /// A denylisted term matched without any of its required context
    /// keywords. The candidate is excluded; the run continues.
    #[error("Ambiguous entity: {0}")]
    AmbiguousEntity(String),

    /// Coverage too low to assert validated/unvalidated either way.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<String> for DomainError {
    fn from(s: String) -> Self {
        DomainError::Database(s)
    }
}

impl From<&str> for DomainError {
    fn from(s: &str) -> Self {
        DomainError::InvalidInput(s.to_string())
    }
}
