use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::SqlStreamError;
use crate::types::ErrorMode;

/// Options for opening a [`Database`].
///
/// Missing fields take their defaults when deserialised, so a JSON document of
/// `{"path": "app.db"}` is a complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseOptions {
    /// File path, `:memory:`, or a `file:` URI.
    pub path: PathBuf,
    pub read_only: bool,
    /// Create the file if it does not exist. Ignored when `read_only` is set.
    pub create: bool,
    pub busy_timeout_ms: Option<u64>,
    /// Switch the journal to write-ahead logging after opening.
    pub wal: bool,
    /// Error mode inherited by every binder.
    pub error_mode: ErrorMode,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from(":memory:"),
            read_only: false,
            create: true,
            busy_timeout_ms: None,
            wal: false,
            error_mode: ErrorMode::Raise,
        }
    }
}

impl DatabaseOptions {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_error_mode(mut self, error_mode: ErrorMode) -> Self {
        self.error_mode = error_mode;
        self
    }

    /// Parse options from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `SqlStreamError::ConfigError` if the document is malformed or the
    /// options are inconsistent.
    pub fn from_json(json: &str) -> Result<Self, SqlStreamError> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Check that the options can be applied together.
    ///
    /// # Errors
    ///
    /// Returns `SqlStreamError::ConfigError` when `wal` is requested on a read-only
    /// database.
    pub fn validate(&self) -> Result<(), SqlStreamError> {
        if self.read_only && self.wal {
            return Err(SqlStreamError::ConfigError(
                "cannot switch a read-only database to WAL".into(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn open_flags(&self) -> OpenFlags {
        let mut flags = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if self.read_only {
            flags |= OpenFlags::SQLITE_OPEN_READ_ONLY;
        } else {
            flags |= OpenFlags::SQLITE_OPEN_READ_WRITE;
            if self.create {
                flags |= OpenFlags::SQLITE_OPEN_CREATE;
            }
        }
        flags
    }

    pub(crate) fn connect(&self) -> Result<Connection, SqlStreamError> {
        self.validate()?;
        let conn = Connection::open_with_flags(&self.path, self.open_flags())?;
        if let Some(ms) = self.busy_timeout_ms {
            conn.busy_timeout(Duration::from_millis(ms))?;
        }
        if self.wal {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        Ok(conn)
    }
}

/// Fluent builder for [`DatabaseOptions`].
#[derive(Debug, Clone)]
pub struct DatabaseOptionsBuilder {
    opts: DatabaseOptions,
}

impl DatabaseOptionsBuilder {
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            opts: DatabaseOptions::new(path),
        }
    }

    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.opts.read_only = read_only;
        self
    }

    #[must_use]
    pub fn create(mut self, create: bool) -> Self {
        self.opts.create = create;
        self
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    #[must_use]
    pub fn wal(mut self, wal: bool) -> Self {
        self.opts.wal = wal;
        self
    }

    #[must_use]
    pub fn error_mode(mut self, error_mode: ErrorMode) -> Self {
        self.opts.error_mode = error_mode;
        self
    }

    #[must_use]
    pub fn finish(self) -> DatabaseOptions {
        self.opts
    }

    /// Open the database, recording a failure on the returned value.
    #[must_use]
    pub fn open(self) -> Database<'static> {
        Database::with_options(&self.finish())
    }

    /// Open the database.
    ///
    /// # Errors
    ///
    /// Returns `SqlStreamError` if the options are inconsistent or the engine
    /// cannot open the file.
    pub fn try_open(self) -> Result<Database<'static>, SqlStreamError> {
        Database::try_with_options(&self.finish())
    }
}
