// Copyright (c) The testdrive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured detail embedded in test output.
//!
//! A test may print a JSON object to standard output instead of free-form text. If that object
//! carries both `result` and `reason`, its `plot` and `analysis` fields are rendered as images
//! and tables instead of a literal block.

use crate::{errors::AssembleError, render::row};
use camino::{Utf8Path, Utf8PathBuf};
use itertools::Itertools;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use testdrive_junit::CaseId;

/// The subdirectory of the output directory that images are copied into.
pub static IMAGES_DIR: &str = "images";

static ANALYSIS_TABLE_TITLE: &str = "analysis";

/// Images and tables extracted from a test case's output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TestDetail {
    images: Vec<ImageSpec>,
    tables: Vec<DetailTable>,
}

/// An image to embed, given by path with an optional title.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageSpec {
    /// The caption for the image.
    pub title: Option<String>,

    /// The path to the source image.
    pub path: Utf8PathBuf,
}

/// A titled two-column table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetailTable {
    /// The caption for the table.
    pub title: String,

    /// Rows, sorted by key.
    pub rows: BTreeMap<String, String>,
}

impl TestDetail {
    /// Extracts detail from `output`.
    ///
    /// Returns `None` if `output` is not a JSON object with both `result` and `reason` keys, or
    /// if its `plot` or `analysis` fields are malformed. Callers should then render the output
    /// verbatim.
    pub fn from_output(output: &str) -> Option<Self> {
        let Ok(Value::Object(object)) = serde_json::from_str::<Value>(output) else {
            return None;
        };
        if !(object.contains_key("result") && object.contains_key("reason")) {
            return None;
        }

        let images = match object.get("plot") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => {
                let images: Option<Vec<_>> = items.iter().map(ImageSpec::from_json).collect();
                if images.is_none() {
                    tracing::warn!("ignoring structured output: `plot` has an entry without a path");
                }
                images?
            }
            Some(_) => {
                tracing::warn!("ignoring structured output: `plot` is not a list");
                return None;
            }
        };

        let tables = match object.get("analysis") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Object(analysis)) => analysis_tables(analysis),
            Some(_) => {
                tracing::warn!("ignoring structured output: `analysis` is not an object");
                return None;
            }
        };

        Some(Self { images, tables })
    }

    /// Returns the images, in order.
    pub fn images(&self) -> &[ImageSpec] {
        &self.images
    }

    /// Returns the tables, in order.
    pub fn tables(&self) -> &[DetailTable] {
        &self.tables
    }

    /// Renders this detail, copying images into the `images` subdirectory of `objdir`.
    ///
    /// Copied images are named after `case_id` and their position, keeping the source extension.
    pub fn to_asciidoc(
        &self,
        case_id: CaseId,
        objdir: &Utf8Path,
    ) -> Result<Vec<String>, AssembleError> {
        let mut lines = Vec::new();

        if !self.images.is_empty() {
            let images_dir = objdir.join(IMAGES_DIR);
            std::fs::create_dir_all(&images_dir).map_err(|error| AssembleError::Write {
                path: images_dir.clone(),
                error,
            })?;

            for (index, image) in self.images.iter().enumerate() {
                let file_name = match image.path.extension() {
                    Some(extension) => format!("{case_id}-{index}.{extension}"),
                    None => format!("{case_id}-{index}"),
                };
                let target = images_dir.join(&file_name);
                std::fs::copy(&image.path, &target).map_err(|error| AssembleError::Copy {
                    from: image.path.clone(),
                    to: target.clone(),
                    error,
                })?;
                tracing::debug!("copied image `{}` to `{target}`", image.path);

                lines.push(String::new());
                lines.push(format!(".{}", image.caption()));
                lines.push(format!("image::{file_name}[]"));
            }
        }

        for table in &self.tables {
            lines.extend(table.to_asciidoc());
        }
        Ok(lines)
    }
}

impl ImageSpec {
    fn from_json(item: &Value) -> Option<Self> {
        match item {
            Value::String(path) => Some(Self {
                title: None,
                path: path.into(),
            }),
            Value::Object(object) => {
                let Some(Value::String(path)) = object.get("path") else {
                    return None;
                };
                let title = match object.get("title") {
                    None | Some(Value::Null) => None,
                    Some(title) => Some(cell_text(title)),
                };
                Some(Self {
                    title,
                    path: path.into(),
                })
            }
            _ => None,
        }
    }

    /// The title, or the file name of the source path if there is no title.
    pub fn caption(&self) -> &str {
        self.title
            .as_deref()
            .filter(|title| !title.is_empty())
            .or_else(|| self.path.file_name())
            .unwrap_or_default()
    }
}

impl DetailTable {
    /// Renders this table with bold keys.
    pub fn to_asciidoc(&self) -> Vec<String> {
        let mut lines = vec![
            String::new(),
            format!(".{}", self.title),
            "[cols=\"1,4\"]".to_owned(),
            "|===".to_owned(),
            String::new(),
        ];
        lines.extend(
            self.rows
                .iter()
                .map(|(key, value)| row([format!("*{key}*"), value.clone()])),
        );
        lines.push(String::new());
        lines.push("|===".to_owned());
        lines
    }
}

// Object values become their own tables. Everything else is collected into a leading "analysis"
// table, with sequences joined one element per line.
fn analysis_tables(analysis: &Map<String, Value>) -> Vec<DetailTable> {
    let mut summary = BTreeMap::new();
    let mut tables = Vec::new();

    for (key, value) in analysis {
        match value {
            Value::Object(rows) => tables.push(DetailTable {
                title: key.clone(),
                rows: rows
                    .iter()
                    .map(|(key, value)| (key.clone(), cell_text(value)))
                    .collect(),
            }),
            Value::Array(items) => {
                summary.insert(key.clone(), items.iter().map(cell_text).join("\n"));
            }
            scalar => {
                summary.insert(key.clone(), cell_text(scalar));
            }
        }
    }

    if !summary.is_empty() {
        tables.insert(
            0,
            DetailTable {
                title: ANALYSIS_TABLE_TITLE.to_owned(),
                rows: summary,
            },
        );
    }
    tables
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
