//! Two-pass tabular formatter for document listings.
//!
//! The first pass happens while rows are collected: every [`Table::push`]
//! widens the columns to fit the new row. The second pass is
//! [`Table::render`], which writes an optional header and then one line per
//! row, each column padded to its final width.
//!
//! Rows are rendered most recently pushed first.
//!
//! # Examples
//!
//! ```
//! use ks_core::{Arena, RenderOptions, Row, Table};
//!
//! let arena = Arena::new();
//! let mut table = Table::new(&arena);
//! table.push(Row { id: 1, title: "lease", category: "house", tags: &["2024"] });
//! table.push(Row { id: 2, title: "insurance policy", category: "car", tags: &[] });
//!
//! let mut out = Vec::new();
//! table.render(&mut out, RenderOptions::plain()).unwrap();
//! let text = String::from_utf8(out).unwrap();
//! let lines: Vec<&str> = text.lines().collect();
//! assert_eq!(lines[0].trim_end(), "ID  Category  Title             Tags");
//! assert_eq!(lines[1].trim_end(), " 2  car       insurance policy");
//! assert_eq!(lines[2].trim_end(), " 1  house     lease             2024");
//! ```

use std::io::{self, Write};

use bumpalo::collections::Vec as BumpVec;

use crate::Arena;

pub const ID_HEADER: &str = "ID";
pub const CATEGORY_HEADER: &str = "Category";
pub const TITLE_HEADER: &str = "Title";
pub const TAGS_HEADER: &str = "Tags";

const COLUMN_GAP: &str = "  ";
const INITIAL_ID_CAPACITY: i64 = 100;
const UNDERLINE: &str = "\x1b[4m";
const RESET: &str = "\x1b[0m";

/// One document line of a listing. All text is borrowed from an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row<'a> {
    pub id: i64,
    pub title: &'a str,
    pub category: &'a str,
    pub tags: &'a [&'a str],
}

impl Row<'_> {
    /// Printable width of the tag cell: each label plus one separator space.
    pub fn tag_width(&self) -> usize {
        self.tags.iter().map(|tag| tag.chars().count() + 1).sum()
    }
}

/// Computed width of each column, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnWidths {
    pub id: usize,
    pub category: usize,
    pub title: usize,
    pub tags: usize,
}

impl ColumnWidths {
    fn headers() -> Self {
        Self {
            id: ID_HEADER.len(),
            category: CATEGORY_HEADER.len(),
            title: TITLE_HEADER.len(),
            tags: TAGS_HEADER.len(),
        }
    }

    /// Width of every rendered line, separators included.
    pub fn line_width(&self) -> usize {
        self.id + self.category + self.title + self.tags + 3 * COLUMN_GAP.len()
    }
}

/// Output switches for [`Table::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emit the column-name line.
    pub header: bool,
    /// Wrap the header line in terminal underline escapes.
    pub underline: bool,
}

impl RenderOptions {
    /// Header without escape codes.
    pub fn plain() -> Self {
        Self {
            header: true,
            underline: false,
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            header: true,
            underline: true,
        }
    }
}

/// Accumulated listing rows plus the running column widths.
pub struct Table<'a> {
    rows: BumpVec<'a, Row<'a>>,
    widths: ColumnWidths,
    id_capacity: i64,
}

impl<'a> Table<'a> {
    /// Creates an empty table whose rows are rooted in `arena`.
    pub fn new(arena: &'a Arena) -> Self {
        Self {
            rows: BumpVec::new_in(arena.bump()),
            widths: ColumnWidths::headers(),
            id_capacity: INITIAL_ID_CAPACITY,
        }
    }

    /// Adds a row and widens the columns to fit it.
    pub fn push(&mut self, row: Row<'a>) {
        // The id column grows by one each time an id reaches the next power
        // of ten.
        while row.id >= self.id_capacity {
            match self.id_capacity.checked_mul(10) {
                Some(next) => {
                    self.id_capacity = next;
                    self.widths.id += 1;
                }
                None => {
                    self.widths.id = self.widths.id.max(row.id.to_string().len());
                    break;
                }
            }
        }

        self.widths.title = self.widths.title.max(row.title.chars().count());
        self.widths.category = self.widths.category.max(row.category.chars().count());
        self.widths.tags = self.widths.tags.max(row.tag_width());

        self.rows.push(row);
    }

    /// Rows in render order: most recently pushed first.
    pub fn rows(&self) -> impl Iterator<Item = &Row<'a>> {
        self.rows.iter().rev()
    }

    pub fn widths(&self) -> ColumnWidths {
        self.widths
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Writes the header (if enabled) and every row.
    pub fn render<W: Write>(&self, out: &mut W, options: RenderOptions) -> io::Result<()> {
        if options.header {
            self.render_header(out, options.underline)?;
        }
        for row in self.rows() {
            self.render_row(out, row)?;
        }
        Ok(())
    }

    fn render_header<W: Write>(&self, out: &mut W, underline: bool) -> io::Result<()> {
        let w = self.widths;
        if underline {
            out.write_all(UNDERLINE.as_bytes())?;
        }
        write!(
            out,
            "{:<idw$}{COLUMN_GAP}{:<cw$}{COLUMN_GAP}{:<tw$}{COLUMN_GAP}{:<gw$}",
            ID_HEADER,
            CATEGORY_HEADER,
            TITLE_HEADER,
            TAGS_HEADER,
            idw = w.id,
            cw = w.category,
            tw = w.title,
            gw = w.tags,
        )?;
        if underline {
            out.write_all(RESET.as_bytes())?;
        }
        out.write_all(b"\n")
    }

    fn render_row<W: Write>(&self, out: &mut W, row: &Row<'_>) -> io::Result<()> {
        let w = self.widths;
        let mut tags = String::with_capacity(row.tag_width());
        for tag in row.tags {
            tags.push_str(tag);
            tags.push(' ');
        }
        writeln!(
            out,
            "{:>idw$}{COLUMN_GAP}{:<cw$}{COLUMN_GAP}{:<tw$}{COLUMN_GAP}{:<gw$}",
            row.id,
            row.category,
            row.title,
            tags,
            idw = w.id,
            cw = w.category,
            tw = w.title,
            gw = w.tags,
        )
    }
}
