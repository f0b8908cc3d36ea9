//! Error types for store operations.
//!
//! Provides a unified error type covering opening the store, statement
//! preparation and binding, stepping, transactions, and payload transfer.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite operation failure outside prepare/bind/step (e.g. column reads).
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// The database file could not be opened or created.
    #[error("can't open {}: {source}", path.display())]
    OpenError {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Malformed SQL or a statement that does not match the schema.
    #[error("can't prepare statement: {source}")]
    PrepareError {
        sql: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A parameter could not be bound.
    #[error("failed binding parameter {index}: {source}")]
    BindError {
        index: usize,
        #[source]
        source: rusqlite::Error,
    },

    /// The number of bindings does not match the statement's placeholders.
    #[error("statement expects {expected} binding(s), got {actual}")]
    BindingMismatch { expected: usize, actual: usize },

    /// Stepping a statement failed.
    #[error("statement failed: {0}")]
    StepError(#[source] rusqlite::Error),

    /// Beginning or committing a transaction failed.
    #[error("failed to {op} transaction: {source}")]
    TransactionError {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// Creating the tables failed, typically because they already exist.
    #[error("table creation failed: {0}")]
    SchemaError(#[source] rusqlite::Error),

    /// No document has the requested id.
    #[error("document not found: {0}")]
    DocumentNotFound(i64),

    /// A payload exceeds the largest blob SQLite can hold.
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(u64),

    /// A payload reader ended before its declared length.
    #[error("payload ended after {actual} of {expected} bytes")]
    TruncatedPayload { expected: u64, actual: u64 },

    /// Reading a payload or writing retrieved bytes failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
