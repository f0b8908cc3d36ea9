//! Request model shared by the command layer and the store.
//!
//! A [`Request`] is the parsed intent of one `ks` invocation. It is built by
//! the CLI, checked with [`Request::validate`], and then broken down into the
//! typed inputs the catalog understands ([`NewDocument`], [`DocumentChanges`],
//! [`ListFilter`]).

use std::fmt;
use std::path::PathBuf;

/// The command a single invocation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CommandKind {
    /// Add a new document.
    Add,
    /// Write a document's payload to stdout.
    Cat,
    /// List every category name.
    Categories,
    /// Print usage.
    #[default]
    Help,
    /// Create a new document database.
    Init,
    /// Modify an existing document's metadata.
    Mod,
    /// Remove a document.
    Rm,
    /// Print document metadata as a table.
    Show,
    /// Print the tool or database version.
    Version,
}

impl CommandKind {
    /// Returns the command's name as typed on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Cat => "cat",
            Self::Categories => "categories",
            Self::Help => "help",
            Self::Init => "init",
            Self::Mod => "mod",
            Self::Rm => "rm",
            Self::Show => "show",
            Self::Version => "version",
        }
    }

    /// Returns `true` for commands that must be given a document id.
    pub fn requires_id(self) -> bool {
        matches!(self, Self::Cat | Self::Mod | Self::Rm)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed intent of one invocation.
///
/// # Examples
///
/// ```
/// use ks_core::{CommandKind, Request};
///
/// let request = Request::new(CommandKind::Add)
///     .with_title("Lease agreement")
///     .with_category("contracts")
///     .with_tag("house");
/// assert!(request.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub kind: CommandKind,
    pub id: Option<i64>,
    pub title: Option<String>,
    pub category: Option<String>,
    /// Path of a file whose bytes become the document payload.
    pub file: Option<PathBuf>,
    pub tags: Vec<String>,
    /// Suppress the header line of a listing.
    pub no_header: bool,
    /// Report the database schema version instead of the tool version.
    pub db_version: bool,
}

impl Request {
    /// Creates an empty request for the given command.
    pub fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// Metadata for a document about to be added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    pub title: String,
    /// Category name; `None` files the document under the empty category.
    pub category: Option<String>,
    pub tags: Vec<String>,
}

impl NewDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            category: None,
            tags: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Category name the document is filed under.
    pub fn category_name(&self) -> &str {
        self.category.as_deref().unwrap_or("")
    }
}

/// In-place changes to an existing document.
///
/// Tags are only ever appended; there is no way to detach one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentChanges {
    pub title: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
}

impl DocumentChanges {
    /// Returns `true` if applying these changes would touch nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.category.is_none() && self.tags.is_empty()
    }
}

/// Which documents a listing covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListFilter {
    /// Exactly one document.
    ById(i64),
    /// Documents whose category and (optionally) one tag match SQL `LIKE`
    /// patterns. An absent category matches everything.
    Matching {
        category: Option<String>,
        tag: Option<String>,
    },
}

impl ListFilter {
    /// A filter that matches every document.
    pub fn all() -> Self {
        Self::Matching {
            category: None,
            tag: None,
        }
    }
}

impl Default for ListFilter {
    fn default() -> Self {
        Self::all()
    }
}
