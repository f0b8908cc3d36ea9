//! Document payload transfer through SQLite incremental blob I/O.
//!
//! A payload is stored in two steps: the row is written with a zero-filled
//! blob of the right length ([`Binding::ZeroBlob`]), then the bytes are
//! copied into it [`CHUNK_SIZE`] bytes at a time. Retrieval streams the blob
//! out in the same chunk size, so neither direction holds a whole payload in
//! memory.

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use rusqlite::Connection;

use crate::binding::Binding;
use crate::error::{Result, StoreError};

/// Size of each read/write against a payload blob.
pub const CHUNK_SIZE: usize = 4096;

const DATABASE: &str = "main";
const TABLE: &str = "documents";
const COLUMN: &str = "data";

/// Bytes to attach to a document: a reader plus its declared length.
///
/// A zero-length payload is stored as `NULL`, exactly like no payload.
pub struct Payload<'r> {
    reader: Box<dyn Read + 'r>,
    len: u64,
}

impl<'r> Payload<'r> {
    pub fn new(reader: impl Read + 'r, len: u64) -> Self {
        Self {
            reader: Box::new(reader),
            len,
        }
    }

    pub fn from_bytes(bytes: &'r [u8]) -> Self {
        Self::new(bytes, bytes.len() as u64)
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Payload<'static> {
    /// Opens a file as a payload, taking its length from the file metadata.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self::new(file, len))
    }
}

impl fmt::Debug for Payload<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload").field("len", &self.len).finish()
    }
}

/// Binding for the `data` column: `NULL` when there is nothing to store,
/// otherwise a zero blob of the payload's length.
pub(crate) fn placeholder(payload: Option<&Payload<'_>>) -> Result<Binding<'static>> {
    match payload {
        None => Ok(Binding::Null),
        Some(p) if p.is_empty() => Ok(Binding::Null),
        Some(p) => i32::try_from(p.len)
            .map(Binding::ZeroBlob)
            .map_err(|_| StoreError::PayloadTooLarge(p.len)),
    }
}

/// Copies `payload` into the zero blob of document `id`.
///
/// Returns the number of bytes written.
pub(crate) fn write_chunks(conn: &Connection, id: i64, payload: Payload<'_>) -> Result<u64> {
    let expected = payload.len;
    if expected == 0 {
        return Ok(0);
    }

    let mut blob = conn.blob_open(DATABASE, TABLE, COLUMN, id, false)?;
    let mut reader = payload.reader.take(expected);
    let mut chunk = [0u8; CHUNK_SIZE];
    let mut written = 0u64;

    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        blob.write_all(&chunk[..n])?;
        written += n as u64;
    }

    if written != expected {
        return Err(StoreError::TruncatedPayload {
            expected,
            actual: written,
        });
    }
    Ok(written)
}

/// Streams the payload blob of document `id` into `out`.
///
/// Returns the number of bytes copied.
pub(crate) fn read_chunks<W: Write + ?Sized>(conn: &Connection, id: i64, out: &mut W) -> Result<u64> {
    let mut blob = conn.blob_open(DATABASE, TABLE, COLUMN, id, true)?;
    let mut chunk = [0u8; CHUNK_SIZE];
    let mut copied = 0u64;

    loop {
        let n = match blob.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        out.write_all(&chunk[..n])?;
        copied += n as u64;
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_for_absent_and_empty_payload_is_null() {
        assert_eq!(placeholder(None).unwrap(), Binding::Null);
        let empty = Payload::from_bytes(&[]);
        assert_eq!(placeholder(Some(&empty)).unwrap(), Binding::Null);
    }

    #[test]
    fn test_placeholder_sizes_zero_blob() {
        let bytes = [1u8, 2, 3];
        let payload = Payload::from_bytes(&bytes);
        assert_eq!(placeholder(Some(&payload)).unwrap(), Binding::ZeroBlob(3));
    }

    #[test]
    fn test_placeholder_rejects_oversized_payload() {
        let payload = Payload::new(io::empty(), i32::MAX as u64 + 1);
        assert!(matches!(
            placeholder(Some(&payload)),
            Err(StoreError::PayloadTooLarge(_))
        ));
    }

    #[test]
    fn test_open_reads_length_from_metadata() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello").unwrap();
        let payload = Payload::open(file.path()).unwrap();
        assert_eq!(payload.len(), 5);
    }

    #[test]
    fn test_truncated_reader_is_detected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE documents (id INTEGER PRIMARY KEY, data BLOB);")
            .unwrap();
        conn.execute("INSERT INTO documents (data) VALUES (?)", [Binding::ZeroBlob(10)])
            .unwrap();
        let id = conn.last_insert_rowid();

        let short = Payload::new(&b"abc"[..], 10);
        let err = write_chunks(&conn, id, short).unwrap_err();
        assert!(matches!(
            err,
            StoreError::TruncatedPayload {
                expected: 10,
                actual: 3
            }
        ));
    }
}
