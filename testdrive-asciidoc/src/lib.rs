// Copyright (c) The testdrive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generate an AsciiDoc test report from JUnit XML results.
//!
//! This crate is the command-line front end: it parses arguments, sets up logging, reads inputs
//! and hands them to [`testdrive_report`].

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::OutputWriter;
