//! Diagnostics emitted while matching arguments.
//!
//! The matcher never writes to a stream itself; it hands every problem to a
//! [`DiagnosticSink`]. [`LogSink`] routes them through `tracing`,
//! [`Collector`] keeps them for inspection and [`Ignore`] drops them.

use std::fmt;

/// Something noteworthy found while matching arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A dash token that matched no option.
    UnrecognisedArgument(String),
    /// A letter inside a flag cluster that matched no short flag.
    UnrecognisedFlag(char),
    /// An option was not followed by enough value tokens; scanning halted
    /// (or skipped the option, depending on settings).
    MissingValue(String),
    /// The value text could not be converted for the option's kind.
    InvalidValue { option: String, value: String },
    /// A required option was not supplied.
    RequiredMissing(String),
    /// A leftover option reported by the caller as unhandled.
    UnhandledOption(String),
    /// `--help` was seen; carries the rendered usage text.
    HelpRequested { usage: String },
}

impl Diagnostic {
    /// Whether this diagnostic marks a failure rather than a warning.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Diagnostic::MissingValue(_)
                | Diagnostic::InvalidValue { .. }
                | Diagnostic::RequiredMissing(_)
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnrecognisedArgument(arg) => write!(f, "unrecognised argument {}", arg),
            Diagnostic::UnrecognisedFlag(c) => write!(f, "unrecognised argument -{}", c),
            Diagnostic::MissingValue(option) => write!(f, "missing value for {}", option),
            Diagnostic::InvalidValue { option, value } => {
                write!(f, "invalid value {} for {}", value, option)
            }
            Diagnostic::RequiredMissing(name) => {
                write!(f, "required argument {} not supplied", name)
            }
            Diagnostic::UnhandledOption(opt) => write!(f, "unhandled option: -{}", opt),
            Diagnostic::HelpRequested { .. } => f.write_str("help requested"),
        }
    }
}

/// Receiver for diagnostics produced during matching.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Default sink: warnings and errors go to `tracing`, usage text goes to
/// standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::HelpRequested { usage } => eprint!("{}", usage),
            d if d.is_error() => tracing::error!("{}", d),
            d => tracing::warn!("{}", d),
        }
    }
}

/// Sink that records every diagnostic in order.
#[derive(Debug, Default, Clone)]
pub struct Collector {
    pub diagnostics: Vec<Diagnostic>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

impl DiagnosticSink for Collector {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ignore;

impl DiagnosticSink for Ignore {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}

impl<F: FnMut(Diagnostic)> DiagnosticSink for F {
    fn report(&mut self, diagnostic: Diagnostic) {
        self(diagnostic)
    }
}
