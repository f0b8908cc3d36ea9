//! Typed positional statement parameters.

use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, Value, ValueRef};

/// One positional parameter of a prepared statement.
///
/// Text is bound borrowed: the referenced string must outlive the executor
/// call, and is never copied into the statement.
///
/// # Examples
///
/// ```
/// use ks_sqlite::Binding;
///
/// let title = String::from("lease");
/// let bindings = [Binding::from(title.as_str()), Binding::Integer(3), Binding::Null];
/// assert_eq!(bindings[0], Binding::Text("lease"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding<'a> {
    Null,
    Integer(i64),
    Text(&'a str),
    /// Placeholder blob of the given length, filled in afterwards through
    /// incremental blob I/O.
    ZeroBlob(i32),
}

impl<'a> From<&'a str> for Binding<'a> {
    fn from(text: &'a str) -> Self {
        Self::Text(text)
    }
}

impl From<i64> for Binding<'_> {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl<'a> From<Option<&'a str>> for Binding<'a> {
    fn from(text: Option<&'a str>) -> Self {
        text.map_or(Self::Null, Self::Text)
    }
}

impl ToSql for Binding<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match *self {
            Binding::Null => ToSqlOutput::Owned(Value::Null),
            Binding::Integer(value) => ToSqlOutput::Owned(Value::Integer(value)),
            Binding::Text(text) => ToSqlOutput::Borrowed(ValueRef::Text(text.as_bytes())),
            Binding::ZeroBlob(len) => ToSqlOutput::ZeroBlob(len),
        })
    }
}
