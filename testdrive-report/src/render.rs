// Copyright (c) The testdrive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AsciiDoc text primitives.
//!
//! Everything here is a pure function of its inputs.

use std::{fmt, iter};
use testdrive_junit::{CaseId, CaseResult};

/// The character that introduces an AsciiDoc section title.
pub const HEADING_MARKER: char = '=';

/// Placeholder for a value that was not recorded.
pub static NOT_RECORDED: &str = "[.deemphasize]_not recorded_";

/// Placeholder for an empty table cell.
pub static EMPTY: &str = "[.deemphasize]#-#";

/// A hard page break.
pub static PAGE_BREAK: &str = "<<<";

/// A section heading depth, displayed as that many [`HEADING_MARKER`]s.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Level(usize);

impl Level {
    /// The depth of top-level document sections (`==`).
    pub const SECTION: Self = Self(2);

    /// Creates a level with the given number of markers.
    pub const fn new(depth: usize) -> Self {
        Self(depth)
    }

    /// Returns the number of markers.
    pub fn depth(self) -> usize {
        self.0
    }

    /// Returns the level one step deeper.
    pub fn nested(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        iter::repeat_n(HEADING_MARKER, self.0).try_for_each(|marker| write!(f, "{marker}"))
    }
}

/// Marks `value` as a test success.
pub fn test_success(value: impl fmt::Display) -> String {
    format!("[.test-success]#{value}#")
}

/// Marks `value` as a test failure.
pub fn test_failure(value: impl fmt::Display) -> String {
    format!("[.test-failure]#{value}#")
}

/// Marks `value` as a test error.
pub fn test_error(value: impl fmt::Display) -> String {
    format!("[.test-error]#{value}#")
}

/// Renders a case result as a styled span.
pub fn case_result(result: &CaseResult) -> String {
    match result {
        CaseResult::Success => test_success(result.as_str()),
        CaseResult::Failure { .. } => test_failure(result.as_str()),
        CaseResult::Error { .. } => test_error(result.as_str()),
    }
}

/// Wraps `text` in a literal block, preceded by a blank line.
pub fn literal_block(text: &str) -> String {
    format!("\n....\n{text}\n....")
}

/// Formats a table row, one cell per line.
pub fn row<I>(cells: I) -> String
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    cells
        .into_iter()
        .map(|cell| format!("\n|\n{cell}"))
        .collect()
}

/// Returns `value` unless it is missing or empty.
pub fn or_placeholder<'a>(value: Option<&'a str>, placeholder: &'a str) -> &'a str {
    value.filter(|value| !value.is_empty()).unwrap_or(placeholder)
}

/// The section a case anchor points to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnchorKind {
    /// The case's section in the results.
    Result,
    /// The case's section in the specifications appendix.
    Spec,
}

impl AnchorKind {
    fn suffix(self) -> &'static str {
        match self {
            AnchorKind::Result => "result",
            AnchorKind::Spec => "spec",
        }
    }
}

/// An anchor for a case section.
pub fn anchor(id: CaseId, kind: AnchorKind) -> String {
    format!("[#{id}_{}]", kind.suffix())
}

/// A cross-reference to the section marked by [`anchor`] with the same arguments.
pub fn xref(id: CaseId, kind: AnchorKind) -> String {
    format!("<<{id}_{}>>", kind.suffix())
}
