//! SQL schema of the document store.
//!
//! # Table structure
//!
//! - `categories`: unique-by-convention category names
//! - `documents`: title, category reference, optional payload blob
//! - `tags`: unique-by-convention tag labels
//! - `doctag`: document/tag association rows (duplicates allowed)
//! - `version`: single schema-version marker row
//!
//! Foreign keys are declared but [`Store`](crate::Store) switches their
//! enforcement off, so removing a document leaves its `doctag` rows in place.

/// Schema version written by [`schema_sql`] and reported by `version --db`.
pub const SCHEMA_VERSION: i64 = 0;

/// Generates the statements that create every table and the version row.
pub fn schema_sql() -> String {
    format!(
        r#"
CREATE TABLE categories (
    cid INTEGER PRIMARY KEY,
    cname TEXT
);

CREATE TABLE documents (
    id INTEGER PRIMARY KEY,
    title TEXT,
    cid INTEGER,
    data BLOB,
    FOREIGN KEY (cid) REFERENCES categories(cid)
);

CREATE TABLE tags (
    tid INTEGER PRIMARY KEY,
    label TEXT
);

CREATE TABLE doctag (
    id INTEGER,
    tid INTEGER,
    FOREIGN KEY (id) REFERENCES documents(id),
    FOREIGN KEY (tid) REFERENCES tags(tid)
);

CREATE TABLE version (v INTEGER);

INSERT INTO version (v) VALUES ({SCHEMA_VERSION});
"#
    )
}
