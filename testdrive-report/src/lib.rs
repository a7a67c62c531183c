// Copyright (c) The testdrive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Render JUnit test results, together with the specification documents they were run against,
//! as a single AsciiDoc document.
//!
//! The main entry point is [`Assembler`](assemble::Assembler), which takes a [`Config`] and an
//! output directory and renders a [`TestSuites`](testdrive_junit::TestSuites).

pub mod assemble;
pub mod config;
pub mod detail;
pub mod errors;
pub mod relevel;
pub mod render;

pub use assemble::Assembler;
pub use config::Config;
