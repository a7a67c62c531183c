// Copyright (c) The testdrive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{dispatch::Input, output::StderrStyles};
use owo_colors::OwoColorize;
use std::error::Error;
use testdrive_junit::JunitReadError;
use testdrive_report::errors::{AssembleError, ConfigReadError};
use thiserror::Error;
use tracing::error;

/// Documented exit codes for `testdrive-asciidoc` failures.
///
/// Unknown or unexpected failures always result in exit code 1.
pub enum TestdriveExitCode {}

impl TestdriveExitCode {
    /// No errors occurred and the document was written.
    pub const OK: i32 = 0;

    /// The configuration or an input file could not be loaded.
    pub const SETUP_ERROR: i32 = 96;

    /// An input file is not a valid JUnit report, or conflicts with an earlier one.
    pub const INPUT_PARSE_FAILED: i32 = 104;

    /// Writing the document or a file in the output directory produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}

// The #[error()] strings are placeholders: errors are meant to be printed with
// display_to_stderr, which also prints the source chain.

/// An expected failure, reported to the user with an exit code.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config read error")]
    ConfigReadError {
        #[from]
        err: ConfigReadError,
    },
    #[error("input open error")]
    InputOpenError {
        input: Input,
        #[source]
        err: std::io::Error,
    },
    #[error("input read error")]
    InputReadError {
        input: Input,
        #[source]
        err: JunitReadError,
    },
    #[error("assemble error")]
    AssembleError {
        #[from]
        err: AssembleError,
    },
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigReadError { .. } | Self::InputOpenError { .. } => {
                TestdriveExitCode::SETUP_ERROR
            }
            Self::InputReadError { .. } => TestdriveExitCode::INPUT_PARSE_FAILED,
            Self::AssembleError { err } => match err {
                // Specification documents live in the configured repositories.
                AssembleError::Read { .. } => TestdriveExitCode::SETUP_ERROR,
                _ => TestdriveExitCode::WRITE_OUTPUT_ERROR,
            },
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::ConfigReadError { err } => {
                error!(
                    "failed to load config at `{}`",
                    err.config_file().style(styles.bold)
                );
                err.source()
            }
            Self::InputOpenError { input, err } => {
                error!("failed to open input `{}`", input.style(styles.bold));
                Some(err as &dyn Error)
            }
            Self::InputReadError { input, err } => {
                error!("failed to read JUnit report from `{}`", input.style(styles.bold));
                Some(err as &dyn Error)
            }
            Self::AssembleError { err } => {
                error!("failed to assemble AsciiDoc document");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: "testdrive_asciidoc::no_heading", "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8Path;
    use std::io;
    use test_case::test_case;
    use testdrive_report::Config;

    fn config_error() -> ExpectedError {
        Config::from_json_str(Utf8Path::new("config.json"), "{")
            .unwrap_err()
            .into()
    }

    fn assemble_error(err: AssembleError) -> ExpectedError {
        err.into()
    }

    #[test_case(config_error(), TestdriveExitCode::SETUP_ERROR ; "config")]
    #[test_case(
        ExpectedError::InputOpenError {
            input: Input::Path("missing.xml".into()),
            err: io::Error::from(io::ErrorKind::NotFound),
        },
        TestdriveExitCode::SETUP_ERROR ;
        "input open"
    )]
    #[test_case(
        ExpectedError::InputReadError {
            input: Input::Stdin,
            err: JunitReadError::NoRootElement,
        },
        TestdriveExitCode::INPUT_PARSE_FAILED ;
        "input read"
    )]
    #[test_case(
        assemble_error(AssembleError::Read {
            path: "testspec.adoc".into(),
            error: io::Error::from(io::ErrorKind::PermissionDenied),
        }),
        TestdriveExitCode::SETUP_ERROR ;
        "spec read"
    )]
    #[test_case(
        assemble_error(AssembleError::Output { error: io::Error::from(io::ErrorKind::BrokenPipe) }),
        TestdriveExitCode::WRITE_OUTPUT_ERROR ;
        "output"
    )]
    fn exit_codes(error: ExpectedError, expected: i32) {
        assert_eq!(error.process_exit_code(), expected);
    }
}
