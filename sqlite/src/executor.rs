//! Statement execution with positional bindings and streaming row folds.
//!
//! [`Executor`] is the single path every catalog operation takes to the
//! store. A call prepares the statement (through the connection's statement
//! cache), checks and binds the [`Binding`]s by 1-based ordinal, then steps
//! the statement to completion. Rows are never collected by the executor
//! itself; callers fold over them as they stream past.
//!
//! # Example
//!
//! ```
//! use ks_sqlite::{Binding, Executor};
//! use rusqlite::Connection;
//!
//! let conn = Connection::open_in_memory().unwrap();
//! let exec = Executor::new(&conn);
//! exec.execute("CREATE TABLE t (n INTEGER)", &[]).unwrap();
//! for n in 1..=3 {
//!     exec.execute("INSERT INTO t (n) VALUES (?)", &[Binding::Integer(n)]).unwrap();
//! }
//!
//! let sum = exec
//!     .fold("SELECT n FROM t", &[], 0_i64, |acc, row| Ok(acc + row.get::<_, i64>(0)?))
//!     .unwrap();
//! assert_eq!(sum, 6);
//! ```

use rusqlite::{CachedStatement, Connection, Row, Statement};
use tracing::debug;

use crate::binding::Binding;
use crate::error::{Result, StoreError};

/// Runs statements against one connection.
#[derive(Clone, Copy)]
pub struct Executor<'c> {
    conn: &'c Connection,
}

impl<'c> Executor<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Returns the underlying connection.
    pub fn connection(&self) -> &'c Connection {
        self.conn
    }

    /// Runs `sql` and folds `f` over every result row, in result order.
    ///
    /// # Errors
    ///
    /// - [`StoreError::PrepareError`] for malformed SQL.
    /// - [`StoreError::BindingMismatch`] if `bindings` does not have exactly
    ///   one entry per placeholder.
    /// - [`StoreError::BindError`] / [`StoreError::StepError`] for engine
    ///   failures, and any error `f` returns.
    pub fn fold<T, F>(&self, sql: &str, bindings: &[Binding<'_>], init: T, mut f: F) -> Result<T>
    where
        F: FnMut(T, &Row<'_>) -> Result<T>,
    {
        debug!(sql, bindings = bindings.len(), "executing statement");

        let mut stmt = self.prepare(sql)?;
        bind(&mut stmt, bindings)?;

        let mut acc = init;
        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next().map_err(StoreError::StepError)? {
            acc = f(acc, row)?;
        }
        Ok(acc)
    }

    /// Runs `sql`, invoking `handler` once per result row.
    pub fn for_each<F>(&self, sql: &str, bindings: &[Binding<'_>], mut handler: F) -> Result<()>
    where
        F: FnMut(&Row<'_>) -> Result<()>,
    {
        self.fold(sql, bindings, (), |(), row| handler(row))
    }

    /// Runs `sql` for its side effects, discarding any rows.
    ///
    /// Returns the number of rows changed by the most recent `INSERT`,
    /// `UPDATE` or `DELETE`.
    pub fn execute(&self, sql: &str, bindings: &[Binding<'_>]) -> Result<u64> {
        self.fold(sql, bindings, (), |(), _| Ok(()))?;
        Ok(self.conn.changes() as u64)
    }

    /// Runs `sql` and returns the first column of the last row, if any.
    pub fn scalar(&self, sql: &str, bindings: &[Binding<'_>]) -> Result<Option<i64>> {
        self.fold(sql, bindings, None, |_, row| Ok(Some(row.get(0)?)))
    }

    /// Row id assigned by the most recent successful `INSERT`.
    pub fn last_insert_id(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    /// Runs `f` inside a transaction and commits if it succeeds.
    ///
    /// If `f` fails the transaction is rolled back and the error returned.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Executor<'_>) -> Result<T>,
    {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|source| StoreError::TransactionError {
                op: "begin",
                source,
            })?;

        let value = f(&Executor::new(&tx))?;

        tx.commit()
            .map_err(|source| StoreError::TransactionError {
                op: "commit",
                source,
            })?;
        Ok(value)
    }

    fn prepare(&self, sql: &str) -> Result<CachedStatement<'c>> {
        self.conn
            .prepare_cached(sql)
            .map_err(|source| StoreError::PrepareError {
                sql: sql.to_string(),
                source,
            })
    }
}

fn bind(stmt: &mut Statement<'_>, bindings: &[Binding<'_>]) -> Result<()> {
    let expected = stmt.parameter_count();
    if expected != bindings.len() {
        return Err(StoreError::BindingMismatch {
            expected,
            actual: bindings.len(),
        });
    }

    for (offset, binding) in bindings.iter().enumerate() {
        let index = offset + 1;
        stmt.raw_bind_parameter(index, binding)
            .map_err(|source| StoreError::BindError { index, source })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT);")
            .unwrap();
        conn
    }

    fn insert(exec: &Executor<'_>, body: &str) -> i64 {
        exec.execute("INSERT INTO notes (body) VALUES (?)", &[Binding::Text(body)])
            .unwrap();
        exec.last_insert_id()
    }

    #[test]
    fn test_fold_visits_rows_in_order() {
        let conn = setup();
        let exec = Executor::new(&conn);
        for body in ["a", "b", "c"] {
            insert(&exec, body);
        }

        let bodies = exec
            .fold("SELECT body FROM notes ORDER BY id", &[], Vec::new(), |mut acc, row| {
                acc.push(row.get::<_, String>(0)?);
                Ok(acc)
            })
            .unwrap();
        assert_eq!(bodies, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_execute_reports_changes() {
        let conn = setup();
        let exec = Executor::new(&conn);
        insert(&exec, "x");
        insert(&exec, "y");

        let changed = exec
            .execute("UPDATE notes SET body = ? WHERE id > ?", &[
                Binding::Text("z"),
                Binding::Integer(0),
            ])
            .unwrap();
        assert_eq!(changed, 2);
    }

    #[test]
    fn test_scalar_takes_last_row() {
        let conn = setup();
        let exec = Executor::new(&conn);
        insert(&exec, "dup");
        let second = insert(&exec, "dup");

        let id = exec
            .scalar("SELECT id FROM notes WHERE body = ? ORDER BY id", &[
                Binding::Text("dup"),
            ])
            .unwrap();
        assert_eq!(id, Some(second));

        let none = exec
            .scalar("SELECT id FROM notes WHERE body = ?", &[Binding::Text("absent")])
            .unwrap();
        assert_eq!(none, None);
    }

    #[test]
    fn test_binding_count_mismatch() {
        let conn = setup();
        let exec = Executor::new(&conn);

        let err = exec
            .execute("INSERT INTO notes (id, body) VALUES (?, ?)", &[Binding::Integer(1)])
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::BindingMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_malformed_sql_is_prepare_error() {
        let conn = setup();
        let exec = Executor::new(&conn);

        let err = exec.execute("SELEKT nothing", &[]).unwrap_err();
        assert!(matches!(err, StoreError::PrepareError { .. }));
        assert!(err.to_string().starts_with("can't prepare statement"));

        let err = exec.execute("SELECT missing FROM notes", &[]).unwrap_err();
        assert!(matches!(err, StoreError::PrepareError { .. }));
    }

    #[test]
    fn test_handler_error_stops_iteration() {
        let conn = setup();
        let exec = Executor::new(&conn);
        for body in ["a", "b", "c"] {
            insert(&exec, body);
        }

        let mut seen = 0;
        let result = exec.for_each("SELECT id FROM notes", &[], |_| {
            seen += 1;
            if seen == 2 {
                return Err(StoreError::DocumentNotFound(0));
            }
            Ok(())
        });
        assert!(matches!(result, Err(StoreError::DocumentNotFound(0))));
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_transaction_commits() {
        let conn = setup();
        let exec = Executor::new(&conn);

        let id = exec.transaction(|tx| Ok(insert(tx, "kept"))).unwrap();
        let count = exec
            .scalar("SELECT COUNT(*) FROM notes WHERE id = ?", &[Binding::Integer(id)])
            .unwrap();
        assert_eq!(count, Some(1));
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let conn = setup();
        let exec = Executor::new(&conn);

        let result: Result<()> = exec.transaction(|tx| {
            insert(tx, "discarded");
            tx.execute("INSERT INTO nowhere VALUES (1)", &[])?;
            Ok(())
        });
        assert!(result.is_err());

        let count = exec.scalar("SELECT COUNT(*) FROM notes", &[]).unwrap();
        assert_eq!(count, Some(0));
    }

    #[test]
    fn test_statement_reuse_rebinds() {
        let conn = setup();
        let exec = Executor::new(&conn);
        insert(&exec, "one");
        insert(&exec, "two");

        let sql = "SELECT body FROM notes WHERE id = ?";
        let first = exec
            .fold(sql, &[Binding::Integer(1)], None, |_, row| Ok(Some(row.get::<_, String>(0)?)))
            .unwrap();
        let second = exec
            .fold(sql, &[Binding::Integer(2)], None, |_, row| Ok(Some(row.get::<_, String>(0)?)))
            .unwrap();
        assert_eq!(first.as_deref(), Some("one"));
        assert_eq!(second.as_deref(), Some("two"));
    }
}
