//! Markdown table extraction.
//!
//! Finds pipe-delimited tables (header row, separator row, data rows) in
//! free-form text. Rows without a separator line are not treated as a
//! table.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ROW_PATTERN: Regex = Regex::new(r"^\|.+\|$").unwrap();
    static ref SEPARATOR_PATTERN: Regex = Regex::new(r"^\|[-:| \t]*-[-:| \t]*\|$").unwrap();
}

/// One markdown table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Header cells.
    pub header: Vec<String>,
    /// Data rows, each a list of trimmed cells.
    pub rows: Vec<Vec<String>>,
}

/// Lazy iterator over the tables of a text.
///
/// A header row followed by a separator row opens a table; data rows run
/// until the first line that is not a row, or until the next header and
/// separator pair.
pub struct Tables<'t> {
    lines: Vec<&'t str>,
    pos: usize,
}

impl Tables<'_> {
    fn is_row(&self, at: usize) -> bool {
        self.lines.get(at).is_some_and(|line| ROW_PATTERN.is_match(line))
    }

    fn is_separator(&self, at: usize) -> bool {
        self.lines
            .get(at)
            .is_some_and(|line| SEPARATOR_PATTERN.is_match(line))
    }

    fn opens_table(&self, at: usize) -> bool {
        self.is_row(at) && !self.is_separator(at) && self.is_separator(at + 1)
    }
}

impl Iterator for Tables<'_> {
    type Item = Table;

    fn next(&mut self) -> Option<Table> {
        while self.pos < self.lines.len() && !self.opens_table(self.pos) {
            self.pos += 1;
        }
        if self.pos >= self.lines.len() {
            return None;
        }

        let header = split_row(self.lines[self.pos]);
        self.pos += 2;

        let mut rows = Vec::new();
        while self.is_row(self.pos) && !self.opens_table(self.pos) {
            if !self.is_separator(self.pos) {
                rows.push(split_row(self.lines[self.pos]));
            }
            self.pos += 1;
        }

        Some(Table { header, rows })
    }
}

/// Iterate over every markdown table found in `text`.
pub fn extract_tables(text: &str) -> Tables<'_> {
    Tables {
        lines: text.lines().map(str::trim).collect(),
        pos: 0,
    }
}

/// Split one table row into trimmed cells, dropping the outer pipes.
pub fn split_row(row: &str) -> Vec<String> {
    let row = row.trim();
    let row = row.strip_prefix('|').unwrap_or(row);
    let row = row.strip_suffix('|').unwrap_or(row);
    row.split('|').map(|cell| cell.trim().to_string()).collect()
}
