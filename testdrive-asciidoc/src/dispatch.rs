// Copyright (c) The testdrive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError, TestdriveExitCode,
    output::{OutputContext, OutputOpts, OutputWriter, clap_styles},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use std::{convert::Infallible, fmt, fs::File, str::FromStr};
use testdrive_junit::TestSuites;
use testdrive_report::{Assembler, Config};
use tracing::info;

/// Generate AsciiDoc from JUnit XML files.
///
/// The document is written to standard output. Test specifications and images it refers to are
/// copied into OBJDIR.
#[derive(Debug, Parser)]
#[command(version, styles = clap_styles::style())]
pub struct TestdriveApp {
    /// Directory to copy included AsciiDoc and image files to
    objdir: Utf8PathBuf,

    /// JSON config locating test specifications
    ///
    /// `repositories` maps a repository name to a local path. `suites` maps a suite name to an
    /// object with `repository` (a repository name) and `baseurl` (the base URL of the suite's
    /// test identifiers). A test's identifier is its `test_id` property; its path relative to
    /// `baseurl` is the directory within the repository that holds its testspec.adoc.
    config: Utf8PathBuf,

    /// Input JUnit XML files, or `-` to read from standard input
    #[arg(value_name = "INPUT")]
    inputs: Vec<Input>,

    #[command(flatten)]
    output: OutputOpts,
}

impl TestdriveApp {
    /// Initializes logging and color support.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, writing the document to `writer`.
    pub fn exec(self, writer: &mut OutputWriter) -> Result<i32, ExpectedError> {
        let config = Config::from_json_file(&self.config)?;

        let mut suites = TestSuites::new();
        for input in &self.inputs {
            input.include_into(&mut suites)?;
        }
        info!(
            "read {} test suites from {} inputs",
            suites.len(),
            self.inputs.len()
        );

        Assembler::new(&config, &self.objdir)
            .write_document(&suites, &mut writer.stdout_writer())?;
        Ok(TestdriveExitCode::OK)
    }
}

/// A JUnit XML input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    /// Standard input, given as `-`.
    Stdin,
    /// A file.
    Path(Utf8PathBuf),
}

impl Input {
    fn include_into(&self, suites: &mut TestSuites) -> Result<(), ExpectedError> {
        let result = match self {
            Self::Stdin => suites.include_reader(std::io::stdin().lock()),
            Self::Path(path) => {
                let file = File::open(path).map_err(|err| ExpectedError::InputOpenError {
                    input: self.clone(),
                    err,
                })?;
                suites.include_reader(file)
            }
        };
        result.map_err(|err| ExpectedError::InputReadError {
            input: self.clone(),
            err,
        })?;
        Ok(())
    }
}

impl FromStr for Input {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "-" => Self::Stdin,
            path => Self::Path(Utf8Path::new(path).to_owned()),
        })
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => write!(f, "<stdin>"),
            Self::Path(path) => write!(f, "{path}"),
        }
    }
}
