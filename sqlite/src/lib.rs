//! SQLite storage backend for the `ks` document catalog.
//!
//! This crate provides the typed execution layer every command funnels
//! through, and the catalog operations built on it.
//!
//! # Architecture
//!
//! The crate is organized into six modules:
//!
//! - **`binding`**: [`Binding`], the tagged positional parameter
//! - **`executor`**: [`Executor`]: prepare, bind, step, fold over rows,
//!   transaction bracketing
//! - **`blob`**: [`Payload`] and chunked incremental blob transfer
//! - **`schema`**: table definitions and the schema version
//! - **`store`**: [`Store`], the connection and its statement cache
//! - **`catalog`**: [`Catalog`]: add, modify, remove, retrieve, list
//!
//! # Quick start
//!
//! ```no_run
//! use ks_core::{Arena, ListFilter, NewDocument, RenderOptions};
//! use ks_sqlite::{Payload, Store};
//!
//! let store = Store::create("documents.ksdb").unwrap();
//! let catalog = store.catalog();
//!
//! let doc = NewDocument::new("car insurance").with_category("car").with_tag("2024");
//! catalog.add(&doc, Some(Payload::open("policy.pdf").unwrap())).unwrap();
//!
//! let arena = Arena::new();
//! let table = catalog.list(&ListFilter::all(), &arena).unwrap();
//! table.render(&mut std::io::stdout(), RenderOptions::default()).unwrap();
//! ```

mod binding;
mod blob;
mod catalog;
mod error;
mod executor;
mod schema;
mod store;

pub use binding::Binding;
pub use blob::{CHUNK_SIZE, Payload};
pub use catalog::Catalog;
pub use error::{Result, StoreError};
pub use executor::Executor;
pub use schema::{SCHEMA_VERSION, schema_sql};
pub use store::{STATEMENT_CACHE_CAPACITY, Store};
