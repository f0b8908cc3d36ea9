//! Request validation and decomposition.
//!
//! Catches user-input errors (missing id or title, more than one tag filter)
//! before a store is opened, then splits a valid [`Request`] into the typed
//! inputs of the catalog operations.
//!
//! # Examples
//!
//! ```
//! use ks_core::{CommandKind, CoreError, ListFilter, Request};
//!
//! let show = Request::new(CommandKind::Show).with_tag("tax");
//! assert_eq!(
//!     show.list_filter().unwrap(),
//!     ListFilter::Matching { category: None, tag: Some("tax".into()) },
//! );
//!
//! let bad = Request::new(CommandKind::Show).with_tag("tax").with_tag("2023");
//! assert!(matches!(bad.validate(), Err(CoreError::MultipleTagFilter)));
//! ```

use crate::error::{CoreError, Result};
use crate::{CommandKind, DocumentChanges, ListFilter, NewDocument, Request};

impl Request {
    /// Checks the request against the rules of its command.
    ///
    /// # Errors
    ///
    /// - [`CoreError::MissingId`] for `cat`, `mod`, and `rm` without an id.
    /// - [`CoreError::MissingTitle`] for `add` without a title.
    /// - [`CoreError::EmptyTitle`] for `add` or `mod` with an empty title.
    /// - [`CoreError::MultipleTagFilter`] for `show` without an id and with
    ///   more than one tag.
    pub fn validate(&self) -> Result<()> {
        if self.kind.requires_id() && self.id.is_none() {
            return Err(CoreError::MissingId(self.kind));
        }

        match self.kind {
            CommandKind::Add => match self.title.as_deref() {
                None => return Err(CoreError::MissingTitle),
                Some(title) if title.is_empty() => return Err(CoreError::EmptyTitle),
                Some(_) => {}
            },
            CommandKind::Mod => {
                if self.title.as_deref() == Some("") {
                    return Err(CoreError::EmptyTitle);
                }
            }
            CommandKind::Show => {
                if self.id.is_none() && self.tags.len() > 1 {
                    return Err(CoreError::MultipleTagFilter);
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Builds the metadata of the document an `add` request creates.
    pub fn new_document(&self) -> Result<NewDocument> {
        self.validate()?;
        let title = self.title.clone().ok_or(CoreError::MissingTitle)?;
        Ok(NewDocument {
            title,
            category: self.category.clone(),
            tags: self.tags.clone(),
        })
    }

    /// Builds the changes a `mod` request applies.
    pub fn changes(&self) -> Result<DocumentChanges> {
        self.validate()?;
        Ok(DocumentChanges {
            title: self.title.clone(),
            category: self.category.clone(),
            tags: self.tags.clone(),
        })
    }

    /// Builds the filter of a `show` request.
    ///
    /// An id takes precedence; category and tag are then ignored. An empty
    /// category is the same as no category filter.
    pub fn list_filter(&self) -> Result<ListFilter> {
        self.validate()?;
        if let Some(id) = self.id {
            return Ok(ListFilter::ById(id));
        }
        Ok(ListFilter::Matching {
            category: self.category.clone().filter(|c| !c.is_empty()),
            tag: self.tags.first().cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_requires_title() {
        let request = Request::new(CommandKind::Add);
        assert!(matches!(request.validate(), Err(CoreError::MissingTitle)));

        let request = Request::new(CommandKind::Add).with_title("");
        assert!(matches!(request.validate(), Err(CoreError::EmptyTitle)));
    }

    #[test]
    fn test_id_commands_require_id() {
        for kind in [CommandKind::Cat, CommandKind::Mod, CommandKind::Rm] {
            let err = Request::new(kind).validate().unwrap_err();
            assert!(matches!(err, CoreError::MissingId(k) if k == kind));
            assert!(Request::new(kind).with_id(3).validate().is_ok());
        }
    }

    #[test]
    fn test_missing_id_message_names_command() {
        let err = Request::new(CommandKind::Cat).validate().unwrap_err();
        assert_eq!(err.to_string(), "cat command requires an id");
    }

    #[test]
    fn test_empty_category_filter_matches_everything() {
        let request = Request::new(CommandKind::Show).with_category("");
        assert_eq!(request.list_filter().unwrap(), ListFilter::all());
    }

    #[test]
    fn test_mod_rejects_empty_title() {
        let request = Request::new(CommandKind::Mod).with_id(1).with_title("");
        assert!(matches!(request.validate(), Err(CoreError::EmptyTitle)));
    }

    #[test]
    fn test_show_rejects_multiple_tags_without_id() {
        let request = Request::new(CommandKind::Show).with_tag("a").with_tag("b");
        assert!(matches!(request.validate(), Err(CoreError::MultipleTagFilter)));

        // With an id the tags are ignored entirely.
        let request = request.with_id(4);
        assert_eq!(request.list_filter().unwrap(), ListFilter::ById(4));
    }

    #[test]
    fn test_list_filter_without_arguments_matches_all() {
        let request = Request::new(CommandKind::Show);
        assert_eq!(request.list_filter().unwrap(), ListFilter::all());
    }

    #[test]
    fn test_list_filter_carries_category_and_tag() {
        let request = Request::new(CommandKind::Show)
            .with_category("bills")
            .with_tag("gas");
        assert_eq!(
            request.list_filter().unwrap(),
            ListFilter::Matching {
                category: Some("bills".to_string()),
                tag: Some("gas".to_string()),
            }
        );
    }

    #[test]
    fn test_new_document_copies_fields() {
        let request = Request::new(CommandKind::Add)
            .with_title("passport scan")
            .with_category("identity")
            .with_tag("travel")
            .with_tag("scan");
        let doc = request.new_document().unwrap();
        assert_eq!(doc.title, "passport scan");
        assert_eq!(doc.category_name(), "identity");
        assert_eq!(doc.tags, vec!["travel", "scan"]);
    }

    #[test]
    fn test_changes_keep_absent_fields_absent() {
        let request = Request::new(CommandKind::Mod).with_id(2).with_tag("urgent");
        let changes = request.changes().unwrap();
        assert!(changes.title.is_none());
        assert!(changes.category.is_none());
        assert_eq!(changes.tags, vec!["urgent"]);
    }
}
