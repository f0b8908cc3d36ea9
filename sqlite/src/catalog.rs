//! Document catalog operations.
//!
//! Provides [`Catalog`] for adding, modifying, removing, retrieving and
//! listing documents. Every operation is a fixed statement (or a short
//! sequence of them) run through the [`Executor`]; multi-statement writes are
//! bracketed in one transaction.
//!
//! # Example
//!
//! ```
//! use ks_core::{Arena, ListFilter, NewDocument};
//! use ks_sqlite::{Payload, Store};
//!
//! let store = Store::open_in_memory().unwrap();
//! store.init().unwrap();
//! let catalog = store.catalog();
//!
//! let doc = NewDocument::new("electricity bill").with_category("bills").with_tag("2024");
//! let id = catalog.add(&doc, Some(Payload::from_bytes(b"%PDF-1.7"))).unwrap();
//!
//! let arena = Arena::new();
//! let table = catalog.list(&ListFilter::ById(id), &arena).unwrap();
//! let row = table.rows().next().unwrap();
//! assert_eq!(row.title, "electricity bill");
//! assert_eq!(row.tags, &["2024"]);
//!
//! let mut bytes = Vec::new();
//! catalog.write_payload(id, &mut bytes).unwrap();
//! assert_eq!(bytes, b"%PDF-1.7");
//! ```

use std::io::Write;

use bumpalo::collections::Vec as BumpVec;
use ks_core::{Arena, DocumentChanges, ListFilter, NewDocument, Row, Table};
use rusqlite::types::ValueRef;
use tracing::{debug, info, warn};

use crate::binding::Binding;
use crate::blob::{self, Payload};
use crate::error::{Result, StoreError};
use crate::executor::Executor;

const SELECT_CATEGORY_ID: &str = "SELECT cid FROM categories WHERE cname = ?;";
const INSERT_CATEGORY: &str = "INSERT INTO categories (cname) VALUES (?);";
const SELECT_TAG_ID: &str = "SELECT tid FROM tags WHERE label = ?;";
const INSERT_TAG: &str = "INSERT INTO tags (label) VALUES (?);";
const INSERT_DOCTAG: &str = "INSERT INTO doctag (id, tid) VALUES (?, ?);";

const INSERT_DOCUMENT: &str = "INSERT INTO documents (title, cid, data) VALUES (?, ?, ?);";
const SELECT_DOCUMENT_ID: &str = "SELECT id FROM documents WHERE id = ?;";
const UPDATE_TITLE: &str = "UPDATE documents SET title = ? WHERE id = ?;";
const UPDATE_CATEGORY: &str = "UPDATE documents SET cid = ? WHERE id = ?;";
const UPDATE_DATA: &str = "UPDATE documents SET data = ? WHERE id = ?;";
const DELETE_DOCUMENT: &str = "DELETE FROM documents WHERE id = ?;";
const SELECT_PAYLOAD_LENGTH: &str = "SELECT length(data) FROM documents WHERE id = ?;";

const SELECT_CATEGORIES: &str = "SELECT cname FROM categories ORDER BY cid;";
const SELECT_VERSION: &str = "SELECT v FROM version;";

const SELECT_DOCUMENT_TAGS: &str = "SELECT label \
     FROM doctag INNER JOIN tags ON doctag.tid = tags.tid \
     WHERE doctag.id = ? \
     ORDER BY doctag.rowid;";

const LIST_BY_ID: &str = "SELECT documents.id, title, cname \
     FROM documents INNER JOIN categories ON documents.cid = categories.cid \
     WHERE documents.id = ?;";

const LIST_BY_CATEGORY: &str = "SELECT documents.id, title, cname \
     FROM documents INNER JOIN categories ON documents.cid = categories.cid \
     WHERE cname LIKE ? \
     ORDER BY documents.id;";

const LIST_BY_TAG: &str = "SELECT DISTINCT documents.id, title, cname \
     FROM documents JOIN categories ON documents.cid = categories.cid \
     JOIN doctag ON documents.id = doctag.id \
     JOIN tags ON doctag.tid = tags.tid \
     WHERE cname LIKE ? AND label LIKE ? \
     ORDER BY documents.id;";

/// `LIKE` pattern used when a listing has no (or an empty) category filter.
const ANY: &str = "%";

/// Catalog operations over one connection.
#[derive(Clone, Copy)]
pub struct Catalog<'c> {
    exec: Executor<'c>,
}

impl<'c> Catalog<'c> {
    pub fn new(exec: Executor<'c>) -> Self {
        Self { exec }
    }

    /// Adds a document and returns its id.
    ///
    /// The category (the empty category when none is given), the document
    /// row, its payload, and every tag association are written in a single
    /// transaction. Missing categories and tags are created.
    pub fn add(&self, doc: &NewDocument, payload: Option<Payload<'_>>) -> Result<i64> {
        let data = blob::placeholder(payload.as_ref())?;

        let id = self.exec.transaction(|tx| {
            let catalog = Catalog::new(*tx);
            let cid = catalog.category_id(doc.category_name())?;

            tx.execute(
                INSERT_DOCUMENT,
                &[Binding::Text(&doc.title), Binding::Integer(cid), data],
            )?;
            let id = tx.last_insert_id();

            if let Some(payload) = payload {
                blob::write_chunks(tx.connection(), id, payload)?;
            }
            for label in &doc.tags {
                catalog.attach_tag(id, label)?;
            }
            Ok(id)
        })?;

        info!(id, title = %doc.title, "document added");
        Ok(id)
    }

    /// Applies `changes` (and a replacement payload, if given) to document `id`.
    ///
    /// Tags in `changes` are appended to the document's existing tags.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DocumentNotFound`] if no document has that id.
    pub fn modify(
        &self,
        id: i64,
        changes: &DocumentChanges,
        payload: Option<Payload<'_>>,
    ) -> Result<()> {
        if changes.is_empty() && payload.is_none() {
            warn!(id, "modify request changes nothing");
        }
        let data = match &payload {
            Some(p) => Some(blob::placeholder(Some(p))?),
            None => None,
        };

        self.exec.transaction(|tx| {
            let catalog = Catalog::new(*tx);
            if !catalog.exists(id)? {
                return Err(StoreError::DocumentNotFound(id));
            }

            if let Some(category) = &changes.category {
                let cid = catalog.category_id(category)?;
                tx.execute(UPDATE_CATEGORY, &[Binding::Integer(cid), Binding::Integer(id)])?;
            }
            if let Some(title) = &changes.title {
                tx.execute(UPDATE_TITLE, &[Binding::Text(title), Binding::Integer(id)])?;
            }
            if let (Some(data), Some(payload)) = (data, payload) {
                tx.execute(UPDATE_DATA, &[data, Binding::Integer(id)])?;
                blob::write_chunks(tx.connection(), id, payload)?;
            }
            for label in &changes.tags {
                catalog.attach_tag(id, label)?;
            }
            Ok(())
        })?;

        info!(id, "document modified");
        Ok(())
    }

    /// Deletes document `id`. Its tag associations are left in place.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DocumentNotFound`] if no document has that id.
    pub fn remove(&self, id: i64) -> Result<()> {
        let removed = self.exec.execute(DELETE_DOCUMENT, &[Binding::Integer(id)])?;
        if removed == 0 {
            return Err(StoreError::DocumentNotFound(id));
        }
        info!(id, "document removed");
        Ok(())
    }

    /// Writes the exact payload bytes of document `id` to `out`.
    ///
    /// A document without a payload writes nothing. Returns the number of
    /// bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DocumentNotFound`] if no document has that id.
    pub fn write_payload<W: Write + ?Sized>(&self, id: i64, out: &mut W) -> Result<u64> {
        let length = self.exec.fold(
            SELECT_PAYLOAD_LENGTH,
            &[Binding::Integer(id)],
            None,
            |_, row| Ok(Some(row.get::<_, Option<i64>>(0)?)),
        )?;

        match length {
            None => Err(StoreError::DocumentNotFound(id)),
            Some(None) | Some(Some(0)) => Ok(0),
            Some(Some(_)) => blob::read_chunks(self.exec.connection(), id, out),
        }
    }

    /// Every category name, in creation order.
    pub fn categories<'a>(&self, arena: &'a Arena) -> Result<Vec<&'a str>> {
        self.exec
            .fold(SELECT_CATEGORIES, &[], Vec::new(), |mut names, row| {
                names.push(arena_text(arena, row, 0)?);
                Ok(names)
            })
    }

    /// Collects the documents matching `filter` into a [`Table`].
    ///
    /// Each document's tags are resolved with one extra query per row.
    pub fn list<'a>(&self, filter: &ListFilter, arena: &'a Arena) -> Result<Table<'a>> {
        let (sql, bindings) = match filter {
            ListFilter::ById(id) => (LIST_BY_ID, vec![Binding::Integer(*id)]),
            ListFilter::Matching { category, tag } => {
                let category = category.as_deref().filter(|c| !c.is_empty());
                let category = Binding::Text(category.unwrap_or(ANY));
                match tag {
                    Some(tag) => (LIST_BY_TAG, vec![category, Binding::Text(tag)]),
                    None => (LIST_BY_CATEGORY, vec![category]),
                }
            }
        };

        self.exec
            .fold(sql, &bindings, Table::new(arena), |mut table, row| {
                let id: i64 = row.get(0)?;
                let title = arena_text(arena, row, 1)?;
                let category = arena_text(arena, row, 2)?;
                let tags = self.tags_for(id, arena)?;
                table.push(Row {
                    id,
                    title,
                    category,
                    tags,
                });
                Ok(table)
            })
    }

    /// Tag labels of document `id`, most recently attached first.
    pub fn tags_for<'a>(&self, id: i64, arena: &'a Arena) -> Result<&'a [&'a str]> {
        let mut tags = self.exec.fold(
            SELECT_DOCUMENT_TAGS,
            &[Binding::Integer(id)],
            BumpVec::new_in(arena.bump()),
            |mut tags, row| {
                tags.push(arena_text(arena, row, 0)?);
                Ok(tags)
            },
        )?;
        tags.reverse();
        Ok(tags.into_bump_slice())
    }

    /// Schema version recorded when the store was initialized.
    pub fn schema_version(&self) -> Result<i64> {
        self.exec
            .scalar(SELECT_VERSION, &[])?
            .ok_or(StoreError::DatabaseError(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Resolves a category name to its id, creating the category if needed.
    ///
    /// Not atomic across processes: two invocations racing on a new name can
    /// both insert it.
    pub fn category_id(&self, name: &str) -> Result<i64> {
        lookup_or_create(&self.exec, SELECT_CATEGORY_ID, INSERT_CATEGORY, name)
    }

    /// Resolves a tag label to its id, creating the tag if needed.
    pub fn tag_id(&self, label: &str) -> Result<i64> {
        lookup_or_create(&self.exec, SELECT_TAG_ID, INSERT_TAG, label)
    }

    fn attach_tag(&self, id: i64, label: &str) -> Result<()> {
        let tid = self.tag_id(label)?;
        self.exec
            .execute(INSERT_DOCTAG, &[Binding::Integer(id), Binding::Integer(tid)])?;
        Ok(())
    }

    fn exists(&self, id: i64) -> Result<bool> {
        Ok(self
            .exec
            .scalar(SELECT_DOCUMENT_ID, &[Binding::Integer(id)])?
            .is_some())
    }
}

fn lookup_or_create(exec: &Executor<'_>, select: &str, insert: &str, name: &str) -> Result<i64> {
    let bindings = [Binding::Text(name)];
    if let Some(id) = exec.scalar(select, &bindings)? {
        debug!(name, id, "resolved existing entry");
        return Ok(id);
    }

    exec.execute(insert, &bindings)?;
    let id = exec.last_insert_id();
    debug!(name, id, "created entry");
    Ok(id)
}

/// Copies a text column into the arena. `NULL` reads as the empty string.
fn arena_text<'a>(arena: &'a Arena, row: &rusqlite::Row<'_>, idx: usize) -> Result<&'a str> {
    let value = row.get_ref(idx)?;
    if let ValueRef::Null = value {
        return Ok("");
    }
    let text = value.as_str().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(idx, value.data_type(), Box::new(err))
    })?;
    Ok(arena.alloc_str(text))
}
