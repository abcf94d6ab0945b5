//! Stream-style statement binding over `rusqlite`.
//!
//! Submit SQL to a [`Database`] with `<<`, keep binding parameters with `<<`, and
//! end the chain with `>>` into a variable or a per-row callback:
//!
//! ```rust
//! use sql_stream::prelude::*;
//!
//! # fn main() -> Result<(), SqlStreamError> {
//! let db = Database::open_in_memory();
//! db.execute_batch("create table t(a int, b text)")?;
//! (&db << "insert into t values (?,?)" << 5 << "x").execute()?;
//!
//! let mut count = 0;
//! ((&db << "select count(*) from t") >> &mut count)?;
//! assert_eq!(count, 1);
//! # Ok(())
//! # }
//! ```
//!
//! The engine does all the SQL work; this crate only maps Rust types onto its
//! bind and column calls and manages each prepared statement's lifetime.

pub mod binder;
pub mod callback;
pub mod column;
pub mod config;
pub mod database;
pub mod error;
pub mod params;
pub mod prelude;
pub mod record;
pub mod text;
pub mod types;

pub use binder::Binder;
pub use callback::{RowCallback, Rows, rows};
pub use column::FromColumn;
pub use config::{DatabaseOptions, DatabaseOptionsBuilder};
pub use database::Database;
pub use error::SqlStreamError;
pub use params::IntoParam;
pub use record::Record;
pub use text::{SqlText, WideString};
pub use types::{ErrorMode, SqlValue};

pub use rusqlite;
