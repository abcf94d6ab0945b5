//! The statement binder.
//!
//! A [`Binder`] walks one prepared statement through
//! `prepared → {binding}* → {stepping → (row)*} → finalized`. Parameters are bound
//! to successive 1-based placeholders, then the statement is stepped to completion
//! in one of two extraction modes:
//!
//! * single value: `binder >> &mut value` reads column 0 of the only row. A second
//!   row is an error; no row leaves `value` untouched.
//! * per row: `binder >> rows(|a: i64, b: String| ..)` calls the closure once per
//!   row with its arguments read from columns 0, 1, ...
//!
//! The statement is finalized exactly once, either right after extraction or when
//! the binder is dropped. A binder dropped without extraction still runs its
//! statement to completion, discarding any rows. A failure raised in
//! [`ErrorMode::Raise`], including one held back by a `<<` chain, finalizes the
//! statement without running it.

use std::collections::HashMap;
use std::fmt;
use std::ops::{Shl, Shr};
use std::sync::Arc;

use rusqlite::{Connection, Rows as EngineRows, Statement};
use tracing::{debug, warn};

use crate::callback::{RowCallback, Rows};
use crate::column::FromColumn;
use crate::database::SuppressedErrors;
use crate::error::SqlStreamError;
use crate::params::IntoParam;
use crate::record::{Record, build_index};
use crate::types::{ErrorMode, SqlValue};

pub struct Binder<'db> {
    /// `None` once finalized.
    stmt: Option<Statement<'db>>,
    sql: String,
    /// Next 1-based placeholder position.
    index: usize,
    mode: ErrorMode,
    error_occurred: bool,
    /// First error hit by a `<<` chain, surfaced by the next fallible call.
    pending: Option<SqlStreamError>,
    suppressed: &'db SuppressedErrors,
}

impl<'db> Binder<'db> {
    pub(crate) fn new(
        conn: Result<&'db Connection, SqlStreamError>,
        sql: String,
        mode: ErrorMode,
        suppressed: &'db SuppressedErrors,
    ) -> Self {
        let mut binder = Binder {
            stmt: None,
            sql,
            index: 1,
            mode,
            error_occurred: false,
            pending: None,
            suppressed,
        };
        let prepared = match conn {
            Ok(conn) => conn.prepare(&binder.sql).map_err(SqlStreamError::from),
            Err(e) => Err(e),
        };
        match prepared {
            Ok(stmt) => {
                debug!(
                    sql = %binder.sql,
                    parameters = stmt.parameter_count(),
                    "prepared statement"
                );
                binder.stmt = Some(stmt);
            }
            Err(e) => binder.defer(e),
        }
        binder
    }

    /// The SQL text this binder was created from.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Position the next bound parameter goes to (1-based).
    #[must_use]
    pub fn parameter_index(&self) -> usize {
        self.index
    }

    /// Number of placeholders in the statement.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.stmt.as_ref().map_or(0, Statement::parameter_count)
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.stmt.as_ref().map_or(0, Statement::column_count)
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.stmt
            .as_ref()
            .map(|stmt| {
                stmt.column_names()
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.stmt.is_none()
    }

    /// Whether an error has been recorded in [`ErrorMode::Record`].
    #[must_use]
    pub fn error_occurred(&self) -> bool {
        self.error_occurred
    }

    #[must_use]
    pub fn error_mode(&self) -> ErrorMode {
        self.mode
    }

    /// Switch error mode. Moving to [`ErrorMode::Record`] records an error still
    /// waiting to be surfaced.
    pub fn set_error_mode(&mut self, mode: ErrorMode) {
        self.mode = mode;
        if mode == ErrorMode::Record
            && let Some(err) = self.pending.take()
        {
            self.record(&err);
        }
    }

    #[must_use]
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.set_error_mode(mode);
        self
    }

    /// Bind `value` to the next placeholder.
    ///
    /// The placeholder index only advances when the bind succeeds. In
    /// [`ErrorMode::Raise`] a failed bind finalizes the statement unexecuted.
    ///
    /// # Errors
    ///
    /// Returns `SqlStreamError::Sqlite` if the engine rejects the bind (e.g. index
    /// out of range), `SqlStreamError::ParameterError` if `value` cannot be
    /// converted, `SqlStreamError::Finalized` after extraction, or an error deferred
    /// by `<<`. Nothing is returned in [`ErrorMode::Record`].
    pub fn bind<P: IntoParam>(&mut self, value: P) -> Result<&mut Self, SqlStreamError> {
        self.surface_pending()?;
        if let Err(e) = self.bind_value(value) {
            self.fail(e)?;
        }
        Ok(self)
    }

    fn bind_value<P: IntoParam>(&mut self, value: P) -> Result<(), SqlStreamError> {
        let stmt = self.stmt.as_mut().ok_or(SqlStreamError::Finalized)?;
        let value = value.into_param()?;
        stmt.raw_bind_parameter(self.index, value.to_sqlite_value())?;
        debug!(sql = %self.sql, index = self.index, "bound parameter");
        self.index += 1;
        Ok(())
    }

    /// Single-value extraction: write column 0 of the only result row into
    /// `target`. Zero rows leave `target` as it was.
    ///
    /// # Errors
    ///
    /// Returns `SqlStreamError::NotAllRowsExtracted` if a second row exists, or
    /// the engine's error if stepping or finalizing fails.
    pub fn extract_into<T: FromColumn>(&mut self, target: &mut T) -> Result<(), SqlStreamError> {
        if let Some(value) = self.single::<T>()? {
            *target = value;
        }
        Ok(())
    }

    /// Single-value extraction returning `None` when there is no row.
    ///
    /// # Errors
    ///
    /// Same as [`Binder::extract_into`].
    pub fn single<T: FromColumn>(&mut self) -> Result<Option<T>, SqlStreamError> {
        let mut slot = None;
        self.run(|rows| {
            if let Some(row) = rows.next()? {
                slot = Some(T::from_column(row, 0)?);
            }
            if rows.next()?.is_some() {
                return Err(SqlStreamError::NotAllRowsExtracted);
            }
            Ok(())
        })?;
        Ok(slot)
    }

    /// Per-row extraction: invoke `callback` once for every result row.
    ///
    /// # Errors
    ///
    /// Returns the engine's error if stepping or finalizing fails, or the first
    /// column conversion that fails. Rows before the failure have been delivered.
    pub fn for_each<Args, F>(&mut self, mut callback: F) -> Result<(), SqlStreamError>
    where
        F: RowCallback<Args>,
    {
        self.run(|rows| {
            while let Some(row) = rows.next()? {
                callback.call_with_row(row)?;
            }
            Ok(())
        })
    }

    /// Per-row extraction for result sets of unknown shape.
    ///
    /// # Errors
    ///
    /// Same as [`Binder::for_each`].
    pub fn for_each_record<F>(&mut self, mut callback: F) -> Result<(), SqlStreamError>
    where
        F: FnMut(Record),
    {
        let names = Arc::new(self.column_names());
        let index: Arc<HashMap<String, usize>> = Arc::new(build_index(&names));
        self.run(|rows| {
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(names.len());
                for i in 0..names.len() {
                    values.push(SqlValue::from_column(row, i)?);
                }
                callback(Record::with_index(Arc::clone(&names), Arc::clone(&index), values));
            }
            Ok(())
        })
    }

    /// Run the statement to completion, discarding any rows, and finalize it.
    ///
    /// # Errors
    ///
    /// Returns the engine's error if stepping or finalizing fails.
    pub fn execute(&mut self) -> Result<(), SqlStreamError> {
        self.run(|rows| {
            while rows.next()?.is_some() {}
            Ok(())
        })
    }

    /// Step the statement through `body`, then finalize it whatever the outcome.
    fn run<F>(&mut self, body: F) -> Result<(), SqlStreamError>
    where
        F: FnOnce(&mut EngineRows<'_>) -> Result<(), SqlStreamError>,
    {
        self.surface_pending()?;
        let Some(mut stmt) = self.stmt.take() else {
            return self.fail(SqlStreamError::Finalized);
        };
        let stepped = {
            let mut rows = stmt.raw_query();
            body(&mut rows)
        };
        let finalized = stmt.finalize().map_err(SqlStreamError::from);
        debug!(sql = %self.sql, "finalized statement");
        match stepped.and(finalized) {
            Ok(()) => Ok(()),
            Err(e) => self.fail(e),
        }
    }

    pub(crate) fn take_pending(&mut self) -> Option<SqlStreamError> {
        self.pending.take()
    }

    fn surface_pending(&mut self) -> Result<(), SqlStreamError> {
        match self.pending.take() {
            Some(err) => {
                self.abandon();
                Err(err)
            }
            None => Ok(()),
        }
    }

    /// Finalize without stepping. A raised failure ends the statement, so
    /// parameters bound so far never reach the engine.
    fn abandon(&mut self) {
        if let Some(stmt) = self.stmt.take() {
            if let Err(err) = stmt.finalize() {
                warn!(sql = %self.sql, error = %err, "finalize after failure");
            }
            debug!(sql = %self.sql, "abandoned statement");
        }
    }

    /// Keep `err` for the next fallible call, or record it right away.
    fn defer(&mut self, err: SqlStreamError) {
        match self.mode {
            ErrorMode::Raise => {
                if self.pending.is_none() {
                    self.pending = Some(err);
                }
            }
            ErrorMode::Record => self.record(&err),
        }
    }

    fn fail(&mut self, err: SqlStreamError) -> Result<(), SqlStreamError> {
        match self.mode {
            ErrorMode::Raise => {
                self.abandon();
                Err(err)
            }
            ErrorMode::Record => {
                self.record(&err);
                Ok(())
            }
        }
    }

    fn record(&mut self, err: &SqlStreamError) {
        warn!(sql = %self.sql, error = %err, "statement error recorded");
        self.error_occurred = true;
        self.suppressed.note(err);
    }
}

impl Drop for Binder<'_> {
    fn drop(&mut self) {
        if self.pending.is_some() {
            self.abandon();
        }
        self.set_error_mode(ErrorMode::Record);
        if self.stmt.is_some() {
            // Result never consumed: step to completion and finalize.
            if let Err(err) = self.execute() {
                self.record(&err);
            }
        }
    }
}

impl fmt::Debug for Binder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder")
            .field("sql", &self.sql)
            .field("index", &self.index)
            .field("finalized", &self.is_finalized())
            .field("mode", &self.mode)
            .field("error_occurred", &self.error_occurred)
            .field("pending", &self.pending)
            .finish()
    }
}

/// `binder << value` binds the next placeholder. A failure is held back and
/// returned by the extraction that ends the chain.
impl<P: IntoParam> Shl<P> for Binder<'_> {
    type Output = Self;

    fn shl(mut self, value: P) -> Self {
        if self.pending.is_none() {
            let bound = self.bind(value).map(|_| ());
            if let Err(e) = bound {
                self.pending = Some(e);
            }
        }
        self
    }
}

/// `binder >> &mut value` is [`Binder::extract_into`].
impl<T: FromColumn> Shr<&mut T> for Binder<'_> {
    type Output = Result<(), SqlStreamError>;

    fn shr(mut self, target: &mut T) -> Self::Output {
        self.extract_into(target)
    }
}

/// `binder >> rows(callback)` is [`Binder::for_each`].
impl<F, Args> Shr<Rows<F, Args>> for Binder<'_>
where
    F: RowCallback<Args>,
{
    type Output = Result<(), SqlStreamError>;

    fn shr(mut self, rows: Rows<F, Args>) -> Self::Output {
        self.for_each(rows.callback)
    }
}
