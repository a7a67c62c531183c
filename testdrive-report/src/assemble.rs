// Copyright (c) The testdrive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assemble the AsciiDoc document from test suites.
//!
//! The document is produced by three independent passes over the same [`TestSuites`]: a summary,
//! the per-case results, and an appendix of test specifications. Each pass is a lazy iterator of
//! text fragments; joining the fragments of a pass with newlines gives that part of the document.
//! No pass modifies the suites, so passes may be run in any order and repeated.

use crate::{
    config::Config,
    detail::TestDetail,
    errors::AssembleError,
    relevel::relevel_headings,
    render::{
        AnchorKind, EMPTY, Level, NOT_RECORDED, PAGE_BREAK, anchor, case_result, literal_block,
        or_placeholder, row, xref,
    },
};
use camino::Utf8Path;
use itertools::Itertools;
use std::io::Write;
use testdrive_junit::{TestCase, TestSuite, TestSuites};

/// Renders [`TestSuites`] into AsciiDoc.
///
/// Auxiliary files (images and specification documents) are copied into `objdir`.
#[derive(Clone, Copy, Debug)]
pub struct Assembler<'a> {
    config: &'a Config,
    objdir: &'a Utf8Path,
}

impl<'a> Assembler<'a> {
    /// Creates a new assembler.
    pub fn new(config: &'a Config, objdir: &'a Utf8Path) -> Self {
        Self { config, objdir }
    }

    /// Writes the complete document to `writer`.
    ///
    /// The summary and results are top-level sections; the specifications are an appendix.
    /// Suites are rendered one level below the top-level sections.
    pub fn write_document(
        self,
        suites: &TestSuites,
        writer: &mut dyn Write,
    ) -> Result<(), AssembleError> {
        let section = Level::SECTION;
        let suite_level = section.nested();

        write_fragments(writer, [Ok(String::new()), Ok(format!("{section} Summary"))])?;
        write_fragments(writer, self.summary(suites, suite_level).map(Ok))?;

        write_fragments(
            writer,
            [Ok(String::new()), Ok(format!("{section} Test Results"))],
        )?;
        write_fragments(writer, self.results(suites, suite_level))?;

        write_fragments(
            writer,
            [
                Ok(String::new()),
                Ok("[appendix]".to_owned()),
                Ok(format!("{section} Test Specifications")),
            ],
        )?;
        write_fragments(writer, self.specs(suites, suite_level))?;

        writer
            .flush()
            .map_err(|error| AssembleError::Output { error })
    }

    /// The summary pass: per suite, a metadata table and a table linking each case's result.
    pub fn summary<'s>(
        self,
        suites: &'s TestSuites,
        level: Level,
    ) -> impl Iterator<Item = String> + 's {
        suites.iter().flat_map(move |suite| {
            suite_heading(suite, level)
                .into_iter()
                .chain(suite_summary(suite))
                .chain(suite_footer())
        })
    }

    /// The results pass: per case, a section with its outcome and output.
    ///
    /// Images in structured output are copied into `objdir` as the pass reaches them.
    pub fn results<'s>(
        self,
        suites: &'s TestSuites,
        level: Level,
    ) -> impl Iterator<Item = Result<String, AssembleError>> + 's
    where
        'a: 's,
    {
        suites.iter().flat_map(move |suite| {
            let case_level = level.nested();
            suite_heading(suite, level)
                .into_iter()
                .map(Ok)
                .chain(
                    suite
                        .cases()
                        .map(move |case| self.case_results(case, case_level))
                        .flatten_ok(),
                )
                .chain(suite_footer().into_iter().map(Ok))
        })
    }

    /// The specifications pass: per case, an included copy of its specification, or a note that
    /// there is none.
    ///
    /// Specifications are copied into `objdir` as the pass reaches them, with their titles moved
    /// down to the case level.
    pub fn specs<'s>(
        self,
        suites: &'s TestSuites,
        level: Level,
    ) -> impl Iterator<Item = Result<String, AssembleError>> + 's
    where
        'a: 's,
    {
        suites.iter().flat_map(move |suite| {
            let case_level = level.nested();
            suite_heading(suite, level)
                .into_iter()
                .map(Ok)
                .chain(
                    suite
                        .cases()
                        .map(move |case| self.case_spec(case, case_level))
                        .flatten_ok(),
                )
                .chain(suite_footer().into_iter().map(Ok))
        })
    }

    fn case_results(self, case: &TestCase, level: Level) -> Result<Vec<String>, AssembleError> {
        let title = self.config.case_title(case)?;
        let duration = case.time.as_ref().map(|time| time.to_string());

        let mut lines = vec![
            String::new(),
            anchor(case.id, AnchorKind::Result),
            format!("{level} {title}"),
            String::new(),
            "[cols=\"1,4\"]".to_owned(),
            "|===".to_owned(),
            String::new(),
            row(["*test specification*", &xref(case.id, AnchorKind::Spec)]),
            row(["*test identifier*", or_placeholder(case.test_id(), NOT_RECORDED)]),
            row([
                "*timestamp*",
                or_placeholder(case.timestamp.as_deref(), NOT_RECORDED),
            ]),
            row([
                "*duration (s)*",
                or_placeholder(duration.as_deref(), NOT_RECORDED),
            ]),
            row(["*result*", &case_result(&case.result)]),
            row(["*reason*", or_placeholder(case.result.reason(), EMPTY)]),
            "|===".to_owned(),
        ];

        if let Some(output) = case.system_out.as_deref() {
            match TestDetail::from_output(output) {
                Some(detail) => lines.extend(detail.to_asciidoc(case.id, self.objdir)?),
                None => {
                    tracing::debug!(
                        "no structured detail for `{}`, rendering output verbatim",
                        case.name
                    );
                    lines.push(literal_block(output));
                }
            }
        }

        lines.push(String::new());
        lines.push(PAGE_BREAK.to_owned());
        Ok(lines)
    }

    fn case_spec(self, case: &TestCase, level: Level) -> Result<Vec<String>, AssembleError> {
        let mut lines = vec![String::new(), anchor(case.id, AnchorKind::Spec)];

        match self.config.testspec_file(case) {
            Some(source) => {
                let file_name = format!("{}.adoc", case.id);
                let target = self.objdir.join(&file_name);
                std::fs::copy(&source, &target).map_err(|error| AssembleError::Copy {
                    from: source.clone(),
                    to: target.clone(),
                    error,
                })?;
                relevel_headings(&target, level)?;
                tracing::debug!("included `{source}` for `{}` as `{target}`", case.name);
                lines.push(format!("include::{file_name}[]"));
            }
            None => {
                let title = self.config.case_title(case)?;
                lines.push(format!("_(No test specification for {title})_"));
            }
        }

        lines.push(String::new());
        lines.push(PAGE_BREAK.to_owned());
        Ok(lines)
    }
}

fn suite_heading(suite: &TestSuite, level: Level) -> [String; 2] {
    [String::new(), format!("{level} Test Suite: {}", suite.name)]
}

fn suite_footer() -> [String; 2] {
    [String::new(), PAGE_BREAK.to_owned()]
}

fn suite_summary(suite: &TestSuite) -> impl Iterator<Item = String> + '_ {
    let metadata = &suite.metadata;
    let duration = metadata.time.as_ref().map(|time| time.to_string());

    let metadata_table = [
        String::new(),
        "[cols=\"1,3\"]".to_owned(),
        "|===".to_owned(),
        String::new(),
        row([
            "*hostname*",
            or_placeholder(metadata.hostname.as_deref(), NOT_RECORDED),
        ]),
        row([
            "*started*",
            or_placeholder(metadata.timestamp.as_deref(), NOT_RECORDED),
        ]),
        row([
            "*duration (s)*",
            or_placeholder(duration.as_deref(), NOT_RECORDED),
        ]),
        row(["*test cases*".to_owned(), metadata.tests.to_string()]),
        row(["*test error*".to_owned(), metadata.errors.to_string()]),
        row(["*test failure*".to_owned(), metadata.failures.to_string()]),
        row(["*test success*".to_owned(), metadata.successes().to_string()]),
        String::new(),
        "|===".to_owned(),
        String::new(),
        "[%header,cols=\"5,1\"]".to_owned(),
        "|===".to_owned(),
        "|case|result".to_owned(),
    ];

    metadata_table
        .into_iter()
        .chain(
            suite
                .cases()
                .map(|case| row([xref(case.id, AnchorKind::Result), case_result(&case.result)])),
        )
        .chain(["|===".to_owned()])
}

// Fragments are separated by newlines, and the last one is followed by a newline.
fn write_fragments(
    writer: &mut dyn Write,
    fragments: impl IntoIterator<Item = Result<String, AssembleError>>,
) -> Result<(), AssembleError> {
    let output_error = |error| AssembleError::Output { error };
    for (index, fragment) in fragments.into_iter().enumerate() {
        if index > 0 {
            writer.write_all(b"\n").map_err(output_error)?;
        }
        writer.write_all(fragment?.as_bytes()).map_err(output_error)?;
    }
    writer.write_all(b"\n").map_err(output_error)
}
