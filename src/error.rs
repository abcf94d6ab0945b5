use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlStreamError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Single-value extraction found a second row.
    #[error("not all rows extracted")]
    NotAllRowsExtracted,

    #[error("Database not connected: {0}")]
    NotConnected(String),

    #[error("Statement already finalized")]
    Finalized,

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("Column conversion error: {0}")]
    ConversionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<serde_json::Error> for SqlStreamError {
    fn from(err: serde_json::Error) -> Self {
        SqlStreamError::ConfigError(format!("invalid options: {err}"))
    }
}
