// Copyright (c) The testdrive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::{Args, ValueEnum};
use owo_colors::{OwoColorize, Style, style};
use std::{
    fmt,
    io::{self, BufWriter, Stdout, Write},
    marker::PhantomData,
};
use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
    level_filters::LevelFilter,
};
use tracing_subscriber::{
    Layer,
    filter::Targets,
    fmt::{FmtContext, FormatEvent, FormatFields, format},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

pub(crate) mod clap_styles {
    use clap::builder::{
        Styles,
        styling::{AnsiColor, Effects, Style},
    };

    const HEADER: Style = AnsiColor::Green.on_default().effects(Effects::BOLD);
    const LITERAL: Style = AnsiColor::Cyan.on_default().effects(Effects::BOLD);
    const PLACEHOLDER: Style = AnsiColor::Cyan.on_default();
    const ERROR: Style = AnsiColor::Red.on_default().effects(Effects::BOLD);

    // Cargo's help colors.
    pub(crate) const fn style() -> Styles {
        Styles::styled()
            .header(HEADER)
            .usage(HEADER)
            .literal(LITERAL)
            .placeholder(PLACEHOLDER)
            .error(ERROR)
            .valid(LITERAL)
            .invalid(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    }
}

/// The environment variable holding the log filter, in `tracing_subscriber` targets syntax.
pub static LOG_ENV: &str = "TESTDRIVE_LOG";

static NO_HEADING_TARGET: &str = "testdrive_asciidoc::no_heading";

#[derive(Copy, Clone, Debug, Args)]
#[must_use]
pub(crate) struct OutputOpts {
    /// Verbose output
    #[arg(long, short, global = true, env = "TESTDRIVE_VERBOSE")]
    pub(crate) verbose: bool,

    /// Produce color output: auto, always, never
    #[arg(
        long,
        value_enum,
        default_value_t,
        hide_possible_values = true,
        global = true,
        value_name = "WHEN",
        env = "CARGO_TERM_COLOR"
    )]
    pub(crate) color: Color,
}

impl OutputOpts {
    pub(crate) fn init(self) -> OutputContext {
        let OutputOpts { verbose, color } = self;
        color.init(verbose);
        OutputContext { color }
    }
}

/// How diagnostics are written to stderr for this run.
#[derive(Copy, Clone, Debug)]
#[must_use]
pub struct OutputContext {
    pub(crate) color: Color,
}

impl OutputContext {
    /// Returns general stderr styles for the current output context.
    pub fn stderr_styles(&self) -> StderrStyles {
        let mut styles = StderrStyles::default();
        if self.color.should_colorize(supports_color::Stream::Stderr) {
            styles.colorize();
        }
        styles
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
#[must_use]
pub enum Color {
    #[default]
    Auto,
    Always,
    Never,
}

static INIT_LOGGER: std::sync::Once = std::sync::Once::new();

impl Color {
    pub(crate) fn init(self, verbose: bool) {
        let formatter = PrefixFormatter {
            colorize: self.should_colorize(supports_color::Stream::Stderr),
        };

        INIT_LOGGER.call_once(|| {
            let default_level = if verbose {
                LevelFilter::DEBUG
            } else {
                LevelFilter::INFO
            };
            let (targets, invalid) = log_targets(std::env::var(LOG_ENV), default_level);

            let layer = tracing_subscriber::fmt::layer()
                .event_format(formatter)
                .with_writer(io::stderr)
                .with_filter(targets);
            tracing_subscriber::registry().with(layer).init();

            if let Some(invalid) = invalid {
                tracing::warn!("ignoring invalid {LOG_ENV}: {invalid}");
            }
        });
    }

    pub(crate) fn should_colorize(self, stream: supports_color::Stream) -> bool {
        match self {
            Color::Auto => supports_color::on_cached(stream).is_some(),
            Color::Always => true,
            Color::Never => false,
        }
    }
}

// An unset or empty variable selects the default level. Anything unusable also selects the
// default level, and is returned so it can be reported once logging is up.
fn log_targets(
    var: Result<String, std::env::VarError>,
    default_level: LevelFilter,
) -> (Targets, Option<String>) {
    let default = || Targets::new().with_default(default_level);
    match var {
        Err(std::env::VarError::NotPresent) => (default(), None),
        Err(std::env::VarError::NotUnicode(_)) => (default(), Some("not UTF-8".to_owned())),
        Ok(value) if value.is_empty() => (default(), None),
        Ok(value) => match value.parse::<Targets>() {
            Ok(targets) => (targets, None),
            Err(error) => (default(), Some(format!("{value:?} ({error})"))),
        },
    }
}

// Prints `<level>: <message>`, with only the label styled. Events sent to the no-heading target
// print the bare message, which is how error source chains are continued.
struct PrefixFormatter {
    colorize: bool,
}

impl PrefixFormatter {
    fn label(&self, level: Level) -> (&'static str, Style) {
        let (label, colored) = match level {
            Level::ERROR => ("error", style().red().bold()),
            Level::WARN => ("warning", style().yellow().bold()),
            Level::INFO => ("info", style().bold()),
            Level::DEBUG => ("debug", style().bold()),
            _ => ("trace", style().dimmed()),
        };
        (label, if self.colorize { colored } else { style() })
    }
}

impl<S, N> FormatEvent<S, N> for PrefixFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        if metadata.target() != NO_HEADING_TARGET {
            let (label, style) = self.label(*metadata.level());
            write!(writer, "{}: ", label.style(style))?;
        }

        let mut message = MessageText::default();
        event.record(&mut message);
        writeln!(writer, "{}", message.0)
    }
}

// Only the message is kept. Structured fields are for filtering and are dropped.
#[derive(Default)]
struct MessageText(String);

impl Visit for MessageText {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.0.push_str(value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

/// Styles for messages written to stderr.
#[derive(Debug, Default)]
pub struct StderrStyles {
    pub(crate) bold: Style,
}

impl StderrStyles {
    fn colorize(&mut self) {
        self.bold = style().bold();
    }
}

/// Where the document is written.
///
/// The test variant is gated by `#[cfg(test)]` so that it is not part of the binary.
#[derive(Default)]
pub enum OutputWriter {
    /// Standard output.
    #[default]
    Normal,
    /// Output captured for tests.
    #[cfg(test)]
    Test {
        /// stdout capture
        stdout: Vec<u8>,
    },
}

impl OutputWriter {
    pub(crate) fn stdout_writer(&mut self) -> StdoutWriter<'_> {
        match self {
            Self::Normal => StdoutWriter::Normal {
                buf: BufWriter::new(io::stdout()),
                _lifetime: PhantomData,
            },
            #[cfg(test)]
            Self::Test { stdout } => StdoutWriter::Test { buf: stdout },
        }
    }
}

pub(crate) enum StdoutWriter<'a> {
    Normal {
        buf: BufWriter<Stdout>,
        _lifetime: PhantomData<&'a ()>,
    },
    #[cfg(test)]
    Test { buf: &'a mut Vec<u8> },
}

impl Write for StdoutWriter<'_> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        match self {
            Self::Normal { buf, .. } => buf.write(data),
            #[cfg(test)]
            Self::Test { buf } => buf.write(data),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Normal { buf, .. } => buf.flush(),
            #[cfg(test)]
            Self::Test { .. } => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Err(std::env::VarError::NotPresent), false ; "unset")]
    #[test_case(Ok(String::new()), false ; "empty")]
    #[test_case(Ok("testdrive_report=debug,warn".to_owned()), false ; "targets")]
    #[test_case(Ok("testdrive_report=loud".to_owned()), true ; "invalid level")]
    fn log_targets_from_env(var: Result<String, std::env::VarError>, invalid: bool) {
        let (_, reported) = log_targets(var, LevelFilter::INFO);
        assert_eq!(reported.is_some(), invalid, "reported: {reported:?}");
    }

    #[test]
    fn default_level_follows_verbosity() {
        let (targets, _) = log_targets(Err(std::env::VarError::NotPresent), LevelFilter::DEBUG);
        assert!(targets.would_enable("testdrive_report::config", &Level::DEBUG));
        let (targets, _) = log_targets(Err(std::env::VarError::NotPresent), LevelFilter::INFO);
        assert!(!targets.would_enable("testdrive_report::config", &Level::DEBUG));
    }

    #[test_case(Level::ERROR, "error")]
    #[test_case(Level::WARN, "warning")]
    #[test_case(Level::INFO, "info")]
    #[test_case(Level::TRACE, "trace")]
    fn level_labels(level: Level, expected: &str) {
        let (label, plain) = PrefixFormatter { colorize: false }.label(level);
        assert_eq!(label, expected);
        assert_eq!(label.style(plain).to_string(), expected);

        let (_, colored) = PrefixFormatter { colorize: true }.label(level);
        assert!(
            label.style(colored).to_string().contains('\x1b'),
            "{level} label is styled when colorizing"
        );
    }
}
