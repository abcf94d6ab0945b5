//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::binder::Binder;
pub use crate::callback::{RowCallback, Rows, rows};
pub use crate::column::FromColumn;
pub use crate::config::{DatabaseOptions, DatabaseOptionsBuilder};
pub use crate::database::Database;
pub use crate::error::SqlStreamError;
pub use crate::params::IntoParam;
pub use crate::record::Record;
pub use crate::text::{SqlText, WideString};
pub use crate::types::{ErrorMode, SqlValue};
