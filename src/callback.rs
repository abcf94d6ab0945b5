use std::marker::PhantomData;

use rusqlite::Row;

use crate::column::FromColumn;
use crate::error::SqlStreamError;

/// A closure invoked once per result row.
///
/// `Args` is the tuple of the closure's parameter types. Each parameter is read from
/// the column at its position, left to right, so `|id: i64, name: String|` expects
/// the row to start with `(integer, text)`. Implemented for closures of up to twelve
/// arguments.
pub trait RowCallback<Args> {
    /// Read this callback's columns from `row` and invoke it.
    ///
    /// # Errors
    ///
    /// Returns the first column read that fails. The callback is not invoked in that
    /// case.
    fn call_with_row(&mut self, row: &Row<'_>) -> Result<(), SqlStreamError>;
}

macro_rules! impl_row_callback {
    ($($ty:ident $var:ident $idx:tt),*) => {
        impl<Func, $($ty,)*> RowCallback<($($ty,)*)> for Func
        where
            Func: FnMut($($ty),*),
            $($ty: FromColumn,)*
        {
            #[allow(unused_variables)]
            fn call_with_row(&mut self, row: &Row<'_>) -> Result<(), SqlStreamError> {
                $(let $var = <$ty as FromColumn>::from_column(row, $idx)?;)*
                (self)($($var),*);
                Ok(())
            }
        }
    };
}

impl_row_callback!();
impl_row_callback!(A a 0);
impl_row_callback!(A a 0, B b 1);
impl_row_callback!(A a 0, B b 1, C c 2);
impl_row_callback!(A a 0, B b 1, C c 2, D d 3);
impl_row_callback!(A a 0, B b 1, C c 2, D d 3, E e 4);
impl_row_callback!(A a 0, B b 1, C c 2, D d 3, E e 4, F f 5);
impl_row_callback!(A a 0, B b 1, C c 2, D d 3, E e 4, F f 5, G g 6);
impl_row_callback!(A a 0, B b 1, C c 2, D d 3, E e 4, F f 5, G g 6, H h 7);
impl_row_callback!(A a 0, B b 1, C c 2, D d 3, E e 4, F f 5, G g 6, H h 7, I i 8);
impl_row_callback!(A a 0, B b 1, C c 2, D d 3, E e 4, F f 5, G g 6, H h 7, I i 8, J j 9);
impl_row_callback!(A a 0, B b 1, C c 2, D d 3, E e 4, F f 5, G g 6, H h 7, I i 8, J j 9, K k 10);
impl_row_callback!(A a 0, B b 1, C c 2, D d 3, E e 4, F f 5, G g 6, H h 7, I i 8, J j 9, K k 10, L l 11);

/// Marks a callback for the `>>` operator's per-row mode.
///
/// ```no_run
/// use sql_stream::prelude::*;
///
/// # fn main() -> Result<(), SqlStreamError> {
/// let db = Database::open_in_memory();
/// ((&db << "select 1, 'one'") >> rows(|n: i64, label: String| {
///     println!("{n} {label}");
/// }))?;
/// # Ok(())
/// # }
/// ```
pub struct Rows<F, Args> {
    pub(crate) callback: F,
    _args: PhantomData<fn(Args)>,
}

/// Wrap `callback` so that `binder >> rows(callback)` streams every row into it.
pub fn rows<Args, F>(callback: F) -> Rows<F, Args>
where
    F: RowCallback<Args>,
{
    Rows {
        callback,
        _args: PhantomData,
    }
}
