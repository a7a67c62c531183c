// Copyright (c) The testdrive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolve test cases to their specification documents.

use crate::{
    errors::{AssembleError, ConfigReadError, ConfigReadErrorKind},
    render::HEADING_MARKER,
};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use std::{
    fs::File,
    io::{BufRead, BufReader},
};
use testdrive_junit::TestCase;

/// The file name of a test specification within a case directory.
pub static TESTSPEC_FILE_NAME: &str = "testspec.adoc";

/// Configuration mapping test identifiers to local specification directories.
///
/// A case's specification lives under the local checkout of a repository. The case's suite
/// names the repository and a base URL; the case's `test_id` property, relative to that base
/// URL, is the path within the repository.
///
/// Both namespaces must be present and must be objects. Entries within them are not validated up
/// front: an entry of the wrong shape is treated as missing when a case is resolved.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Repository name to local directory.
    repositories: IndexMap<String, Lenient<Utf8PathBuf>>,

    /// Suite name to suite configuration.
    suites: IndexMap<String, Lenient<SuiteConfig>>,
}

/// Per-suite configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SuiteConfig {
    /// The repository holding this suite's specifications.
    #[serde(default, deserialize_with = "lenient")]
    pub repository: Option<String>,

    /// The prefix shared by this suite's test identifiers.
    #[serde(default, deserialize_with = "lenient")]
    pub baseurl: Option<String>,
}

// An entry that is `None` unless it has the expected shape.
#[derive(Clone, Debug)]
struct Lenient<T>(Option<T>);

impl<'de, T: DeserializeOwned> Deserialize<'de> for Lenient<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match serde_json::from_value(value) {
            Ok(value) => Ok(Self(Some(value))),
            Err(error) => {
                tracing::debug!("ignoring malformed config entry: {error}");
                Ok(Self(None))
            }
        }
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Lenient::deserialize(deserializer).map(|Lenient(value)| value)
}

impl Config {
    /// Reads JSON configuration from `config_file`.
    pub fn from_json_file(config_file: &Utf8Path) -> Result<Self, ConfigReadError> {
        let json = std::fs::read_to_string(config_file).map_err(|error| {
            ConfigReadError::new(config_file, ConfigReadErrorKind::Read(error))
        })?;
        Self::from_json_str(config_file, &json)
    }

    /// Parses JSON configuration. `config_file` is only used for error reporting.
    pub fn from_json_str(config_file: &Utf8Path, json: &str) -> Result<Self, ConfigReadError> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            ConfigReadError::new(config_file, ConfigReadErrorKind::Deserialize(Box::new(error)))
        })
    }

    /// Returns the configuration for the named suite.
    pub fn suite(&self, name: &str) -> Option<&SuiteConfig> {
        self.suites.get(name)?.0.as_ref()
    }

    /// Returns the local directory holding the files for `case`.
    ///
    /// This only computes the path: it does not check that anything exists there. Returns `None`
    /// if any piece of configuration is missing or malformed, or if the case's `test_id` is not under its
    /// suite's base URL.
    pub fn case_dir(&self, case: &TestCase) -> Option<Utf8PathBuf> {
        let suite = self.suite(case.classname.as_deref()?)?;
        let baseurl = suite.baseurl.as_deref()?;
        let root = self.repositories.get(suite.repository.as_deref()?)?.0.as_ref()?;

        let relative = case.test_id()?.strip_prefix(baseurl)?;
        let relative = relative
            .split_once('?')
            .map_or(relative, |(path, _query)| path);
        Some(root.join(relative.trim_start_matches('/')))
    }

    /// Returns the specification file for `case`, if it exists as a regular file.
    pub fn testspec_file(&self, case: &TestCase) -> Option<Utf8PathBuf> {
        let path = self.case_dir(case)?.join(TESTSPEC_FILE_NAME);
        if path.is_file() {
            Some(path)
        } else {
            tracing::debug!("no test specification for `{}` at `{path}`", case.name);
            None
        }
    }

    /// Returns the title for `case`.
    ///
    /// This is the first section title in the case's specification file, or the case name if
    /// there is no specification or it has no title.
    pub fn case_title(&self, case: &TestCase) -> Result<String, AssembleError> {
        let Some(path) = self.testspec_file(case) else {
            return Ok(case.name.clone());
        };
        let read_error = |error| AssembleError::Read {
            path: path.clone(),
            error,
        };

        let reader = BufReader::new(File::open(&path).map_err(read_error)?);
        for line in reader.lines() {
            let line = line.map_err(read_error)?;
            if line.starts_with(HEADING_MARKER) {
                return Ok(line
                    .trim_start_matches([HEADING_MARKER, ' '])
                    .trim_end()
                    .to_owned());
            }
        }
        Ok(case.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::tempdir;
    use indoc::indoc;
    use test_case::test_case;
    use testdrive_junit::CaseResult;

    fn config(root: &Utf8Path) -> Config {
        let json = serde_json::json!({
            "repositories": { "r": root },
            "suites": {
                "s": { "repository": "r", "baseurl": "http://x/" },
                "no-repo": { "baseurl": "http://x/" },
                "unknown-repo": { "repository": "missing", "baseurl": "http://x/" },
            },
        });
        Config::from_json_str(Utf8Path::new("config.json"), &json.to_string())
            .expect("config is valid")
    }

    fn case(suite: &str, test_id: Option<&str>) -> TestCase {
        let mut case = TestCase::new("case-name", CaseResult::Success);
        case.set_classname(suite);
        if let Some(test_id) = test_id {
            case.set_property(TestCase::TEST_ID_PROPERTY, test_id);
        }
        case
    }

    #[test_case("http://x/sub/case", Some("/data/r/sub/case") ; "relative to base url")]
    #[test_case("http://x//sub/case", Some("/data/r/sub/case") ; "extra slashes stripped")]
    #[test_case("http://x/sub/case?rev=3", Some("/data/r/sub/case") ; "query string dropped")]
    #[test_case("http://y/sub/case", None ; "different base url")]
    fn case_dir_from_test_id(test_id: &str, expected: Option<&str>) {
        let config = config(Utf8Path::new("/data/r"));
        assert_eq!(
            config.case_dir(&case("s", Some(test_id))),
            expected.map(Utf8PathBuf::from)
        );
    }

    #[test_case("s", None ; "no test id")]
    #[test_case("unconfigured", Some("http://x/a") ; "unknown suite")]
    #[test_case("no-repo", Some("http://x/a") ; "suite without repository")]
    #[test_case("unknown-repo", Some("http://x/a") ; "repository not configured")]
    fn case_dir_misses(suite: &str, test_id: Option<&str>) {
        let config = config(Utf8Path::new("/data/r"));
        assert_eq!(config.case_dir(&case(suite, test_id)), None);
    }

    #[test]
    fn case_dir_without_classname() {
        let config = config(Utf8Path::new("/data/r"));
        let mut case = TestCase::new("case-name", CaseResult::Success);
        case.set_property(TestCase::TEST_ID_PROPERTY, "http://x/a");
        assert_eq!(config.case_dir(&case), None);
    }

    #[test]
    fn title_from_testspec() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        std::fs::create_dir_all(dir.path().join("sub/case")).unwrap();
        std::fs::write(
            dir.path().join("sub/case").join(TESTSPEC_FILE_NAME),
            indoc! {"
                :toc:
                == Measure the thing  \t
                = Not this one
            "},
        )
        .unwrap();

        let case = case("s", Some("http://x/sub/case"));
        assert_eq!(
            config.testspec_file(&case),
            Some(dir.path().join("sub/case").join(TESTSPEC_FILE_NAME))
        );
        assert_eq!(config.case_title(&case).unwrap(), "Measure the thing");
    }

    #[test]
    fn title_falls_back_to_case_name() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());

        // A directory, not a file, does not count.
        std::fs::create_dir_all(dir.path().join("a").join(TESTSPEC_FILE_NAME)).unwrap();
        let case_a = case("s", Some("http://x/a"));
        assert_eq!(config.testspec_file(&case_a), None);
        assert_eq!(config.case_title(&case_a).unwrap(), "case-name");

        // A file with no title.
        std::fs::create_dir_all(dir.path().join("b")).unwrap();
        std::fs::write(dir.path().join("b").join(TESTSPEC_FILE_NAME), "just text\n").unwrap();
        let case_b = case("s", Some("http://x/b"));
        assert_eq!(config.case_title(&case_b).unwrap(), "case-name");
    }

    #[test]
    fn missing_namespace_is_an_error() {
        let error = Config::from_json_str(Utf8Path::new("config.json"), r#"{"repositories": {}}"#)
            .unwrap_err();
        assert_eq!(error.config_file().as_str(), "config.json");
        assert!(
            matches!(error.kind(), ConfigReadErrorKind::Deserialize(_)),
            "unexpected error: {error}"
        );
    }

    #[test]
    fn misshapen_namespace_reports_path() {
        let error = Config::from_json_str(
            Utf8Path::new("config.json"),
            r#"{"repositories": [], "suites": {}}"#,
        )
        .unwrap_err();
        let ConfigReadErrorKind::Deserialize(inner) = error.kind() else {
            panic!("unexpected error: {error}");
        };
        assert_eq!(inner.path().to_string(), "repositories");
    }

    #[test]
    fn mistyped_entries_are_misses() {
        let json = serde_json::json!({
            "repositories": { "r": "/data/r", "numeric": 7 },
            "suites": {
                "s": { "repository": "r", "baseurl": "http://x/" },
                "numeric-baseurl": { "repository": "r", "baseurl": 42 },
                "list-repository": { "repository": ["r"], "baseurl": "http://x/" },
                "not-an-object": "http://x/",
                "numeric-root": { "repository": "numeric", "baseurl": "http://x/" },
            },
        });
        let config = Config::from_json_str(Utf8Path::new("config.json"), &json.to_string())
            .expect("entries are checked on use");

        for suite in [
            "numeric-baseurl",
            "list-repository",
            "not-an-object",
            "numeric-root",
        ] {
            assert_eq!(
                config.case_dir(&case(suite, Some("http://x/a"))),
                None,
                "suite {suite}"
            );
        }
        assert_eq!(
            config.case_dir(&case("s", Some("http://x/a"))),
            Some(Utf8PathBuf::from("/data/r/a"))
        );
        assert!(config.suite("not-an-object").is_none());
        assert!(config.suite("numeric-baseurl").is_some());
    }
}
