//! Core types for the `ks` document catalog.
//!
//! This crate holds everything that does not touch the store:
//!
//! - [`Request`]: the parsed intent of one invocation, with
//!   [`Request::validate`] and the typed catalog inputs derived from it
//!   ([`NewDocument`], [`DocumentChanges`], [`ListFilter`]).
//! - [`Arena`]: a bump arena scoped to one command; listing strings and
//!   rows live in it and are released together.
//! - [`Table`]: the two-pass formatter used to render listings.
//! - [`Settings`]: the optional YAML settings file and database path
//!   resolution.
//!
//! # Example
//!
//! ```
//! use ks_core::*;
//!
//! let request = Request::new(CommandKind::Show).with_category("bills");
//! let filter = request.list_filter().unwrap();
//! assert_eq!(
//!     filter,
//!     ListFilter::Matching { category: Some("bills".into()), tag: None },
//! );
//!
//! let arena = Arena::new();
//! let mut table = Table::new(&arena);
//! table.push(Row { id: 7, title: arena.alloc_str("gas"), category: "bills", tags: &[] });
//! assert_eq!(table.len(), 1);
//! ```

mod arena;
mod config;
mod error;
mod table;
mod types;
mod validate;

pub use arena::Arena;
pub use config::{
    DEFAULT_DATABASE_NAME, Settings, default_database_path, default_settings_path, home_dir,
    resolve_database,
};
pub use error::{CoreError, Result};
pub use table::{
    CATEGORY_HEADER, ColumnWidths, ID_HEADER, RenderOptions, Row, TAGS_HEADER, TITLE_HEADER, Table,
};
pub use types::*;
