use std::cell::{Cell, RefCell};
use std::ops::Shl;
use std::path::Path;

use rusqlite::Connection;
use tracing::{debug, warn};

use crate::binder::Binder;
use crate::config::{DatabaseOptions, DatabaseOptionsBuilder};
use crate::error::SqlStreamError;
use crate::text::{SqlText, decode_utf16};
use crate::types::ErrorMode;

#[derive(Debug)]
enum Handle<'c> {
    Owned(Connection),
    Borrowed(&'c Connection),
    Failed(String),
}

/// Errors swallowed by binders running in [`ErrorMode::Record`], including every
/// error hit while a binder is dropped.
#[derive(Debug, Default)]
pub(crate) struct SuppressedErrors {
    count: Cell<u64>,
    last: RefCell<Option<String>>,
}

impl SuppressedErrors {
    pub(crate) fn note(&self, err: &SqlStreamError) {
        self.count.set(self.count.get() + 1);
        *self.last.borrow_mut() = Some(err.to_string());
    }
}

/// Connection facade over one engine handle.
///
/// A failed open does not raise. The failure is kept and reported by
/// [`Database::is_connected`], and every later operation returns
/// `SqlStreamError::NotConnected` with the engine's message.
///
/// The handle is closed on drop only when this value owns it.
#[derive(Debug)]
pub struct Database<'c> {
    handle: Handle<'c>,
    error_mode: ErrorMode,
    suppressed: SuppressedErrors,
}

impl Database<'static> {
    /// Open or create the database file at `path`.
    #[must_use]
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::with_options(&DatabaseOptions::new(path.as_ref()))
    }

    /// Open from a UTF-16 encoded path. A trailing NUL terminator is ignored.
    #[must_use]
    pub fn open_wide(path: &[u16]) -> Self {
        let units = crate::text::strip_terminator(path);
        match decode_utf16(units) {
            Ok(path) => Self::open(path),
            Err(e) => Self::failed(e.to_string(), ErrorMode::default()),
        }
    }

    /// Open a private in-memory database.
    #[must_use]
    pub fn open_in_memory() -> Self {
        match Connection::open_in_memory() {
            Ok(conn) => Self::from_owned(conn),
            Err(e) => Self::failed(e.to_string(), ErrorMode::default()),
        }
    }

    /// Open or create the database file at `path`, failing eagerly.
    ///
    /// # Errors
    ///
    /// Returns `SqlStreamError::Sqlite` if the engine cannot open the file.
    pub fn try_open(path: impl AsRef<Path>) -> Result<Self, SqlStreamError> {
        Self::try_with_options(&DatabaseOptions::new(path.as_ref()))
    }

    /// Open according to `options`, recording (not raising) a failure.
    #[must_use]
    pub fn with_options(options: &DatabaseOptions) -> Self {
        match Self::try_with_options(options) {
            Ok(db) => db,
            Err(e) => {
                warn!(path = %options.path.display(), error = %e, "failed to open database");
                Self::failed(e.to_string(), options.error_mode)
            }
        }
    }

    /// Open according to `options`.
    ///
    /// # Errors
    ///
    /// Returns `SqlStreamError::ConfigError` for inconsistent options and
    /// `SqlStreamError::Sqlite` if the engine rejects the open or the setup pragmas.
    pub fn try_with_options(options: &DatabaseOptions) -> Result<Self, SqlStreamError> {
        let conn = options.connect()?;
        debug!(path = %options.path.display(), "opened database");
        let mut db = Self::from_owned(conn);
        db.error_mode = options.error_mode;
        Ok(db)
    }

    /// Take ownership of an already opened connection. It is closed on drop.
    #[must_use]
    pub fn from_owned(conn: Connection) -> Self {
        Self {
            handle: Handle::Owned(conn),
            error_mode: ErrorMode::default(),
            suppressed: SuppressedErrors::default(),
        }
    }

    #[must_use]
    pub fn builder(path: impl AsRef<Path>) -> DatabaseOptionsBuilder {
        DatabaseOptionsBuilder::new(path.as_ref())
    }

    fn failed(message: String, error_mode: ErrorMode) -> Self {
        Self {
            handle: Handle::Failed(message),
            error_mode,
            suppressed: SuppressedErrors::default(),
        }
    }
}

impl<'c> Database<'c> {
    /// Wrap a connection opened elsewhere. Dropping the result leaves it open.
    #[must_use]
    pub fn from_connection(conn: &'c Connection) -> Self {
        Self {
            handle: Handle::Borrowed(conn),
            error_mode: ErrorMode::default(),
            suppressed: SuppressedErrors::default(),
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        !matches!(self.handle, Handle::Failed(_))
    }

    /// Whether dropping this value closes the handle.
    #[must_use]
    pub fn owns_handle(&self) -> bool {
        matches!(self.handle, Handle::Owned(_))
    }

    /// The engine's message for a failed open.
    #[must_use]
    pub fn open_error(&self) -> Option<&str> {
        match &self.handle {
            Handle::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Error mode handed to every binder this database creates.
    #[must_use]
    pub fn error_mode(&self) -> ErrorMode {
        self.error_mode
    }

    pub fn set_error_mode(&mut self, mode: ErrorMode) {
        self.error_mode = mode;
    }

    /// Borrow the engine connection.
    ///
    /// # Errors
    ///
    /// Returns `SqlStreamError::NotConnected` if the open failed.
    pub fn connection(&self) -> Result<&Connection, SqlStreamError> {
        match &self.handle {
            Handle::Owned(conn) => Ok(conn),
            Handle::Borrowed(conn) => Ok(conn),
            Handle::Failed(message) => Err(SqlStreamError::NotConnected(message.clone())),
        }
    }

    /// Create a binder for `sql`. Compile errors are deferred to the first
    /// bind or extraction (or recorded, in [`ErrorMode::Record`]).
    #[must_use]
    pub fn statement<'s>(&self, sql: impl SqlText<'s>) -> Binder<'_> {
        let (sql, conn) = match sql.into_sql() {
            Ok(sql) => (sql.into_owned(), self.connection()),
            Err(e) => (String::new(), Err(e)),
        };
        Binder::new(conn, sql, self.error_mode, &self.suppressed)
    }

    /// Create a binder for `sql`, compiling it immediately.
    ///
    /// # Errors
    ///
    /// Returns `SqlStreamError::Sqlite` if the statement does not compile, or
    /// `SqlStreamError::NotConnected` if the open failed. In [`ErrorMode::Record`]
    /// both are recorded on the returned binder instead.
    pub fn prepare<'s>(&self, sql: impl SqlText<'s>) -> Result<Binder<'_>, SqlStreamError> {
        let mut binder = self.statement(sql);
        match binder.take_pending() {
            Some(err) => Err(err),
            None => Ok(binder),
        }
    }

    /// Row id of the most recent successful INSERT, or 0 if never connected.
    #[must_use]
    pub fn last_insert_rowid(&self) -> i64 {
        self.connection()
            .map(Connection::last_insert_rowid)
            .unwrap_or(0)
    }

    /// Rows changed by the most recent INSERT, UPDATE or DELETE.
    #[must_use]
    pub fn changes(&self) -> u64 {
        self.connection().map(Connection::changes).unwrap_or(0)
    }

    /// Run one or more `;`-separated statements without parameters.
    ///
    /// # Errors
    ///
    /// Returns `SqlStreamError::Sqlite` on the first failing statement.
    pub fn execute_batch(&self, sql: &str) -> Result<(), SqlStreamError> {
        self.connection()?
            .execute_batch(sql)
            .map_err(SqlStreamError::Sqlite)
    }

    /// Number of errors swallowed by binders of this database.
    #[must_use]
    pub fn suppressed_error_count(&self) -> u64 {
        self.suppressed.count.get()
    }

    /// Message of the most recently swallowed error, clearing it.
    pub fn take_suppressed_error(&self) -> Option<String> {
        self.suppressed.last.borrow_mut().take()
    }

    /// Close the handle now, reporting the engine's close error. Borrowed handles
    /// are left open.
    ///
    /// # Errors
    ///
    /// Returns `SqlStreamError::Sqlite` if the engine refuses to close.
    pub fn close(self) -> Result<(), SqlStreamError> {
        match self.handle {
            Handle::Owned(conn) => {
                debug!("closing database");
                conn.close().map_err(|(_, e)| SqlStreamError::Sqlite(e))
            }
            Handle::Borrowed(_) | Handle::Failed(_) => Ok(()),
        }
    }
}

/// `&db << "sql"` is [`Database::statement`].
impl<'db, 's, S> Shl<S> for &'db Database<'_>
where
    S: SqlText<'s>,
{
    type Output = Binder<'db>;

    fn shl(self, sql: S) -> Binder<'db> {
        self.statement(sql)
    }
}
