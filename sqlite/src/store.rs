//! Store handle: one connection plus its prepared-statement cache.
//!
//! The statements every operation prepares are kept in the connection's
//! cache and finalized together when the [`Store`] drops, after which the
//! connection itself is closed.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use tracing::info;

use crate::catalog::Catalog;
use crate::error::{Result, StoreError};
use crate::executor::Executor;
use crate::schema::schema_sql;

/// Number of distinct prepared statements kept alive per connection.
pub const STATEMENT_CACHE_CAPACITY: usize = 32;

/// An open document store.
///
/// # Examples
///
/// ```
/// use ks_core::NewDocument;
/// use ks_sqlite::Store;
///
/// let store = Store::open_in_memory().unwrap();
/// store.init().unwrap();
/// let id = store.catalog().add(&NewDocument::new("warranty"), None).unwrap();
/// assert_eq!(id, 1);
/// ```
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens an existing store read-write. A missing file is an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::OpenError`] if the file does not exist or
    /// cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(|source| {
            StoreError::OpenError {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::from_connection(conn)
    }

    /// Creates the store file if needed and initializes its tables.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::OpenError`] if the file cannot be created, or
    /// [`StoreError::SchemaError`] if it already holds the tables.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(|source| {
            StoreError::OpenError {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let store = Self::from_connection(conn)?;
        store.init()?;
        info!(path = %path.display(), "created document database");
        Ok(store)
    }

    /// Opens an empty in-memory store. Call [`init`](Self::init) before use.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    /// Wraps an already open connection.
    ///
    /// Foreign-key enforcement is switched off: removing a document leaves
    /// its tag associations in place.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", false)?;
        conn.set_prepared_statement_cache_capacity(STATEMENT_CACHE_CAPACITY);
        Ok(Self { conn })
    }

    /// Creates every table and the version row in one transaction.
    pub fn init(&self) -> Result<()> {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|source| StoreError::TransactionError {
                op: "begin",
                source,
            })?;
        tx.execute_batch(&schema_sql())
            .map_err(StoreError::SchemaError)?;
        tx.commit().map_err(|source| StoreError::TransactionError {
            op: "commit",
            source,
        })?;
        Ok(())
    }

    /// Statement executor bound to this store's connection.
    pub fn executor(&self) -> Executor<'_> {
        Executor::new(&self.conn)
    }

    /// Catalog operations over this store.
    pub fn catalog(&self) -> Catalog<'_> {
        Catalog::new(self.executor())
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
