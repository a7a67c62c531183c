// Copyright (c) The testdrive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shift section titles in an included document so it nests under the including section.

use crate::{
    errors::AssembleError,
    render::{HEADING_MARKER, Level},
};
use camino::Utf8Path;

/// Rewrites the document at `path` so that its first section title is at `level`.
///
/// The first title is taken to be the outermost one. Documents already at `level` or deeper, and
/// documents with no titles, are left untouched. The file is read completely before it is
/// written.
pub fn relevel_headings(path: &Utf8Path, level: Level) -> Result<(), AssembleError> {
    let content = std::fs::read_to_string(path).map_err(|error| AssembleError::Read {
        path: path.to_owned(),
        error,
    })?;
    if let Some(releveled) = relevel_text(&content, level) {
        std::fs::write(path, releveled).map_err(|error| AssembleError::Write {
            path: path.to_owned(),
            error,
        })?;
    }
    Ok(())
}

/// Returns `content` with every title shifted so that the first one is at `level`, or `None` if
/// no shift is needed.
///
/// Lines that are not titles, including their line endings, are kept byte for byte.
pub fn relevel_text(content: &str, level: Level) -> Option<String> {
    let minimum = content.lines().map(heading_depth).find(|&depth| depth > 0)?;
    let shift = level.depth().checked_sub(minimum).filter(|&shift| shift > 0)?;
    let prefix = Level::new(shift).to_string();

    let mut releveled = String::with_capacity(content.len());
    for line in content.split_inclusive('\n') {
        if line.starts_with(HEADING_MARKER) {
            releveled.push_str(&prefix);
        }
        releveled.push_str(line);
    }
    Some(releveled)
}

fn heading_depth(line: &str) -> usize {
    line.chars().take_while(|&c| c == HEADING_MARKER).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::tempdir;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    static DOCUMENT: &str = indoc! {"
        :description: a test
        = Title
        Intro text with a = sign.

        == Procedure
        . step one
        === Detail
    "};

    #[test]
    fn shifts_every_heading() {
        let releveled = relevel_text(DOCUMENT, Level::new(3)).expect("shift needed");
        assert_eq!(
            releveled,
            indoc! {"
                :description: a test
                === Title
                Intro text with a = sign.

                ==== Procedure
                . step one
                ===== Detail
            "}
        );
    }

    #[test_case(1 ; "already at level")]
    #[test_case(0 ; "shallower target")]
    fn no_shift_needed(depth: usize) {
        assert_eq!(relevel_text(DOCUMENT, Level::new(depth)), None);
    }

    #[test]
    fn no_headings() {
        assert_eq!(relevel_text("plain\ntext\n", Level::new(4)), None);
    }

    #[test]
    fn first_heading_sets_minimum() {
        let releveled = relevel_text("== Second\n= First\n", Level::new(4)).unwrap();
        assert_eq!(releveled, "==== Second\n=== First\n");
    }

    #[test]
    fn line_endings_preserved() {
        let releveled = relevel_text("= A\r\nbody\r\n== B", Level::new(2)).unwrap();
        assert_eq!(releveled, "== A\r\nbody\r\n=== B");
    }

    #[test]
    fn rewrites_file_in_place() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("spec.adoc");
        std::fs::write(&path, DOCUMENT).unwrap();

        relevel_headings(&path, Level::new(2)).unwrap();
        let once = std::fs::read_to_string(&path).unwrap();
        assert!(once.contains("\n== Title\n"), "title shifted: {once}");

        // The document now starts at level 2, so a second pass is a no-op.
        relevel_headings(&path, Level::new(2)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), once);
    }
}
