//! Error types for request validation and settings resolution.

use thiserror::Error;

use crate::CommandKind;

/// Errors raised before any store access takes place.
#[derive(Debug, Error)]
pub enum CoreError {
    /// `add` was invoked without a title.
    #[error("title is required when adding a document")]
    MissingTitle,

    /// A title was supplied but is empty.
    #[error("title cannot be empty")]
    EmptyTitle,

    /// A command that operates on one document was given no id.
    #[error("{0} command requires an id")]
    MissingId(CommandKind),

    /// A listing asked to filter on more than one tag.
    #[error("can only filter on a single tag")]
    MultipleTagFilter,

    /// `$HOME` is unset or empty and a default path was needed.
    #[error("can't find HOME directory")]
    HomeNotFound,

    /// Settings file could not be read.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Settings file is not valid YAML for [`Settings`](crate::Settings).
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Convenience alias for results with [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;
