// Copyright (c) The testdrive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read JUnit XML reports into an ordered, duplicate-checked data model.
//!
//! The entry point is [`TestSuites`]: include one or more documents with
//! [`TestSuites::include_str`] or [`TestSuites::include_reader`], then walk suites and cases in
//! the order they were recorded.

mod errors;
mod read;
mod report;

pub use errors::*;
pub use report::*;
