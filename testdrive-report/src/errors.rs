// Copyright (c) The testdrive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced while loading configuration and assembling documents.

use camino::Utf8PathBuf;
use std::io;
use thiserror::Error;

/// An error that occurred while reading the configuration file.
#[derive(Debug, Error)]
#[error("failed to read config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigReadError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigReadErrorKind,
}

impl ConfigReadError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigReadErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file that failed to load.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error that occurred.
    pub fn kind(&self) -> &ConfigReadErrorKind {
        &self.kind
    }
}

/// The kind of [`ConfigReadError`] that occurred.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigReadErrorKind {
    /// The file could not be read.
    #[error("error reading config file")]
    Read(#[source] io::Error),

    /// The file is not valid JSON, or does not have the expected shape.
    #[error("error deserializing config")]
    Deserialize(#[source] Box<serde_path_to_error::Error<serde_json::Error>>),
}

/// An error that occurred while assembling the AsciiDoc document.
///
/// Every one of these aborts the run: no partial output is recovered.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AssembleError {
    /// A specification document could not be read.
    #[error("error reading `{path}`")]
    Read {
        path: Utf8PathBuf,
        #[source]
        error: io::Error,
    },

    /// A file in the output directory could not be written.
    #[error("error writing `{path}`")]
    Write {
        path: Utf8PathBuf,
        #[source]
        error: io::Error,
    },

    /// An image or specification could not be copied into the output directory.
    #[error("error copying `{from}` to `{to}`")]
    Copy {
        from: Utf8PathBuf,
        to: Utf8PathBuf,
        #[source]
        error: io::Error,
    },

    /// The document itself could not be written.
    #[error("error writing AsciiDoc output")]
    Output {
        #[source]
        error: io::Error,
    },
}
