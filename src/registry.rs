//! The argument registry: compiled descriptors plus parse state.

use crate::definition::{compile_into, DefinitionError};
use crate::descriptor::{ArgValue, Descriptor, Flags, Kind};
use crate::diagnostic::{Diagnostic, DiagnosticSink, LogSink};
use crate::help::generate_usage;
use crate::matcher::{self, MatchOutcome, MatchState};
use crate::settings::Settings;
use serde::Serialize;
use thiserror::Error;

/// Errors from typed access to a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
    #[error("option {name} is not {expected}")]
    TypeMismatch { name: String, expected: Kind },

    #[error("unknown option: {0}")]
    UnknownOption(String),

    #[error("option index {index} out of range ({len} options declared)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Serializable view of one descriptor, for diagnostic dumps.
#[derive(Debug, Clone, Serialize)]
pub struct DescriptorSnapshot<'a> {
    pub name: &'a str,
    pub flags: Flags,
    pub attached: bool,
    pub set: bool,
    pub description: &'a str,
    #[serde(flatten)]
    pub value: &'a ArgValue,
}

/// Compiled options and the state of the most recent parse.
///
/// Values and set flags carry over between calls to `parse*`; call
/// [`Args::reset_set`] between parses to start from a clean set state.
#[derive(Debug, Clone)]
pub struct Args {
    definition: String,
    descriptors: Vec<Descriptor>,
    state: MatchState,
    settings: Settings,
}

impl Args {
    /// Compile a definition string with default settings.
    pub fn new(definition: &str) -> Result<Args, DefinitionError> {
        Self::with_settings(definition, Settings::default())
    }

    /// Compile a definition string with the given settings.
    pub fn with_settings(definition: &str, settings: Settings) -> Result<Args, DefinitionError> {
        let mut args = Args {
            definition: String::new(),
            descriptors: Vec::new(),
            state: MatchState::default(),
            settings,
        };
        args.set_format(definition)?;
        Ok(args)
    }

    /// Replace the option definitions.
    ///
    /// On error, the options compiled before the malformed record remain.
    pub fn set_format(&mut self, definition: &str) -> Result<(), DefinitionError> {
        self.definition = definition.to_string();
        self.descriptors.clear();
        compile_into(definition, &mut self.descriptors)
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Whether `--help` was seen by any parse so far.
    pub fn is_help(&self) -> bool {
        self.state.help_requested
    }

    // Parsing

    /// Parse `args` (program name first) without touching the list.
    ///
    /// Diagnostics go to [`LogSink`], which reports warnings and errors
    /// through `tracing` only. Without an installed subscriber (for example
    /// `tracing_subscriber::fmt().init()`) nothing is printed; use
    /// [`Args::parse_with`] with a [`Collector`](crate::Collector) or a
    /// closure to receive them directly.
    pub fn parse<S: AsRef<str>>(&mut self, args: &[S]) -> bool {
        self.parse_with(args, false, &mut LogSink).success
    }

    /// Parse `args` and remove the consumed tokens from it. Diagnostics go
    /// to [`LogSink`], as for [`Args::parse`].
    pub fn parse_compact(&mut self, args: &mut Vec<String>) -> bool {
        let outcome = self.parse_with(args.as_slice(), true, &mut LogSink);
        if let Some(compacted) = outcome.compacted {
            *args = compacted;
        }
        outcome.success
    }

    /// Parse the first `*argc` entries of `argv`, moving the surviving
    /// tokens to the front and updating `*argc` to their count.
    /// Diagnostics go to [`LogSink`], as for [`Args::parse`].
    pub fn parse_argv(&mut self, argv: &mut [String], argc: &mut usize) -> bool {
        let count = (*argc).min(argv.len());
        let outcome = self.parse_with(&argv[..count], true, &mut LogSink);

        if let Some(compacted) = outcome.compacted {
            *argc = compacted.len();
            for (slot, token) in argv.iter_mut().zip(compacted) {
                *slot = token;
            }
        }
        outcome.success
    }

    /// Parse `args`, sending diagnostics to `sink`.
    pub fn parse_with<S: AsRef<str>>(
        &mut self,
        args: &[S],
        compact: bool,
        sink: &mut dyn DiagnosticSink,
    ) -> MatchOutcome {
        matcher::match_args(
            &mut self.descriptors,
            &mut self.state,
            &self.settings,
            args,
            compact,
            sink,
        )
    }

    /// Clear the set flag of every option; values are left as they are.
    pub fn reset_set(&mut self) {
        for descriptor in &mut self.descriptors {
            descriptor.reset_set();
        }
    }

    /// Log every required option that is not set.
    pub fn check_required(&self) -> bool {
        self.check_required_with(&mut LogSink)
    }

    pub fn check_required_with(&self, sink: &mut dyn DiagnosticSink) -> bool {
        matcher::check_required(&self.descriptors, sink)
    }

    /// Classify a leftover token for callers walking the remaining arguments.
    ///
    /// `--` switches off option recognition and yields an empty option;
    /// `-xyz` yields `xyz`; anything else (or anything after `--`) is not
    /// an option.
    pub fn check_option<'t>(&mut self, token: &'t str) -> Option<&'t str> {
        if token == "--" {
            self.state.skip_remaining = true;
            return Some("");
        }

        if self.state.skip_remaining {
            return None;
        }

        token.strip_prefix('-')
    }

    /// Report an option the caller could not handle. Empty options are
    /// ignored.
    pub fn unhandled_option(&self, opt: &str) {
        self.unhandled_option_with(opt, &mut LogSink);
    }

    pub fn unhandled_option_with(&self, opt: &str, sink: &mut dyn DiagnosticSink) {
        if !opt.is_empty() {
            sink.report(Diagnostic::UnhandledOption(opt.to_string()));
        }
    }

    /// Usage text for `program`.
    pub fn usage_text(&self, program: &str) -> String {
        generate_usage(&self.descriptors, program)
    }

    /// Write the usage text to standard error.
    pub fn usage(&self, program: &str) {
        eprint!("{}", self.usage_text(program));
    }

    /// Serializable view of every option, in declaration order.
    pub fn snapshot(&self) -> Vec<DescriptorSnapshot<'_>> {
        self.descriptors
            .iter()
            .map(|d| DescriptorSnapshot {
                name: d.name(),
                flags: d.flags(),
                attached: d.is_attached(),
                set: d.is_set(),
                description: d.description(),
                value: d.value(),
            })
            .collect()
    }

    /// Pretty JSON dump of [`Args::snapshot`].
    pub fn dump_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.snapshot())
    }

    // Lookup

    /// First option whose name matches, honouring the no-case flag.
    pub fn lookup(&self, name: &str) -> Result<&Descriptor, ArgError> {
        self.descriptors
            .iter()
            .find(|d| d.name_matches(name))
            .ok_or_else(|| ArgError::UnknownOption(name.to_string()))
    }

    /// Option by declaration index.
    pub fn descriptor(&self, index: usize) -> Result<&Descriptor, ArgError> {
        self.descriptors
            .get(index)
            .ok_or(ArgError::IndexOutOfRange {
                index,
                len: self.descriptors.len(),
            })
    }

    /// Kind of the named option, if declared.
    pub fn kind_of(&self, name: &str) -> Option<Kind> {
        self.lookup(name).ok().map(Descriptor::kind)
    }

    fn typed<'a, T>(
        descriptor: &'a Descriptor,
        expected: Kind,
        get: impl FnOnce(&'a Descriptor) -> Option<T>,
    ) -> Result<T, ArgError> {
        get(descriptor).ok_or_else(|| ArgError::TypeMismatch {
            name: descriptor.name().to_string(),
            expected,
        })
    }

    fn is_kind(&self, name: &str, kind: Kind) -> bool {
        self.kind_of(name) == Some(kind)
    }

    fn is_kind_at(&self, index: usize, kind: Kind) -> bool {
        self.descriptors.get(index).map(Descriptor::kind) == Some(kind)
    }

    fn is_kind_set(&self, name: &str, kind: Kind) -> bool {
        self.lookup(name)
            .map(|d| d.kind() == kind && d.is_set())
            .unwrap_or(false)
    }

    // Typed access by name

    pub fn try_get_bool(&self, name: &str) -> Result<bool, ArgError> {
        Self::typed(self.lookup(name)?, Kind::Boolean, Descriptor::as_bool)
    }

    pub fn try_get_integer(&self, name: &str) -> Result<i64, ArgError> {
        Self::typed(self.lookup(name)?, Kind::Integer, Descriptor::as_integer)
    }

    pub fn try_get_real(&self, name: &str) -> Result<f64, ArgError> {
        Self::typed(self.lookup(name)?, Kind::Real, Descriptor::as_real)
    }

    pub fn try_get_string(&self, name: &str) -> Result<&str, ArgError> {
        Self::typed(self.lookup(name)?, Kind::String, Descriptor::as_str)
    }

    pub fn try_get_string_list(&self, name: &str) -> Result<&[String], ArgError> {
        Self::typed(self.lookup(name)?, Kind::StringList, Descriptor::as_list)
    }

    pub fn try_get_choice(&self, name: &str) -> Result<i64, ArgError> {
        Self::typed(self.lookup(name)?, Kind::Choice, Descriptor::as_choice)
    }

    /// Value of a boolean option; logs and returns false on a bad lookup.
    pub fn get_bool(&self, name: &str) -> bool {
        self.try_get_bool(name).unwrap_or_else(|e| fallback(e, false))
    }

    /// Value of an integer option; logs and returns 0 on a bad lookup.
    pub fn get_integer(&self, name: &str) -> i64 {
        self.try_get_integer(name).unwrap_or_else(|e| fallback(e, 0))
    }

    /// Value of a real option; logs and returns 0.0 on a bad lookup.
    pub fn get_real(&self, name: &str) -> f64 {
        self.try_get_real(name).unwrap_or_else(|e| fallback(e, 0.0))
    }

    /// Value of a string option; logs and returns "" on a bad lookup.
    pub fn get_string(&self, name: &str) -> &str {
        self.try_get_string(name).unwrap_or_else(|e| fallback(e, ""))
    }

    /// Values of a multiple string option; logs and returns an empty list
    /// on a bad lookup.
    pub fn get_string_list(&self, name: &str) -> &[String] {
        self.try_get_string_list(name)
            .unwrap_or_else(|e| fallback(e, &[]))
    }

    /// Index of the selected choice; logs and returns -1 on a bad lookup.
    pub fn get_choice(&self, name: &str) -> i64 {
        self.try_get_choice(name).unwrap_or_else(|e| fallback(e, -1))
    }

    /// Typed access through [`FromArg`]. Choice options are read with
    /// [`Args::try_get_choice`].
    pub fn get<'a, T: FromArg<'a>>(&'a self, name: &str) -> Result<T, ArgError> {
        let descriptor = self.lookup(name)?;
        Self::typed(descriptor, T::KIND, T::from_descriptor)
    }

    // Typed access by index

    pub fn try_get_bool_at(&self, index: usize) -> Result<bool, ArgError> {
        Self::typed(self.descriptor(index)?, Kind::Boolean, Descriptor::as_bool)
    }

    pub fn try_get_integer_at(&self, index: usize) -> Result<i64, ArgError> {
        Self::typed(self.descriptor(index)?, Kind::Integer, Descriptor::as_integer)
    }

    pub fn try_get_real_at(&self, index: usize) -> Result<f64, ArgError> {
        Self::typed(self.descriptor(index)?, Kind::Real, Descriptor::as_real)
    }

    pub fn try_get_string_at(&self, index: usize) -> Result<&str, ArgError> {
        Self::typed(self.descriptor(index)?, Kind::String, Descriptor::as_str)
    }

    pub fn try_get_string_list_at(&self, index: usize) -> Result<&[String], ArgError> {
        Self::typed(self.descriptor(index)?, Kind::StringList, Descriptor::as_list)
    }

    pub fn try_get_choice_at(&self, index: usize) -> Result<i64, ArgError> {
        Self::typed(self.descriptor(index)?, Kind::Choice, Descriptor::as_choice)
    }

    pub fn get_bool_at(&self, index: usize) -> bool {
        self.try_get_bool_at(index).unwrap_or_else(|e| fallback(e, false))
    }

    pub fn get_integer_at(&self, index: usize) -> i64 {
        self.try_get_integer_at(index).unwrap_or_else(|e| fallback(e, 0))
    }

    pub fn get_real_at(&self, index: usize) -> f64 {
        self.try_get_real_at(index).unwrap_or_else(|e| fallback(e, 0.0))
    }

    pub fn get_string_at(&self, index: usize) -> &str {
        self.try_get_string_at(index).unwrap_or_else(|e| fallback(e, ""))
    }

    pub fn get_string_list_at(&self, index: usize) -> &[String] {
        self.try_get_string_list_at(index)
            .unwrap_or_else(|e| fallback(e, &[]))
    }

    pub fn get_choice_at(&self, index: usize) -> i64 {
        self.try_get_choice_at(index).unwrap_or_else(|e| fallback(e, -1))
    }

    // Kind predicates

    pub fn is_bool_arg(&self, name: &str) -> bool {
        self.is_kind(name, Kind::Boolean)
    }

    pub fn is_integer_arg(&self, name: &str) -> bool {
        self.is_kind(name, Kind::Integer)
    }

    pub fn is_real_arg(&self, name: &str) -> bool {
        self.is_kind(name, Kind::Real)
    }

    pub fn is_string_arg(&self, name: &str) -> bool {
        self.is_kind(name, Kind::String)
    }

    pub fn is_string_list_arg(&self, name: &str) -> bool {
        self.is_kind(name, Kind::StringList)
    }

    pub fn is_choice_arg(&self, name: &str) -> bool {
        self.is_kind(name, Kind::Choice)
    }

    pub fn is_bool_arg_at(&self, index: usize) -> bool {
        self.is_kind_at(index, Kind::Boolean)
    }

    pub fn is_integer_arg_at(&self, index: usize) -> bool {
        self.is_kind_at(index, Kind::Integer)
    }

    pub fn is_real_arg_at(&self, index: usize) -> bool {
        self.is_kind_at(index, Kind::Real)
    }

    pub fn is_string_arg_at(&self, index: usize) -> bool {
        self.is_kind_at(index, Kind::String)
    }

    pub fn is_string_list_arg_at(&self, index: usize) -> bool {
        self.is_kind_at(index, Kind::StringList)
    }

    pub fn is_choice_arg_at(&self, index: usize) -> bool {
        self.is_kind_at(index, Kind::Choice)
    }

    // Set predicates

    pub fn is_bool_arg_set(&self, name: &str) -> bool {
        self.is_kind_set(name, Kind::Boolean)
    }

    pub fn is_integer_arg_set(&self, name: &str) -> bool {
        self.is_kind_set(name, Kind::Integer)
    }

    pub fn is_real_arg_set(&self, name: &str) -> bool {
        self.is_kind_set(name, Kind::Real)
    }

    pub fn is_string_arg_set(&self, name: &str) -> bool {
        self.is_kind_set(name, Kind::String)
    }

    pub fn is_string_list_arg_set(&self, name: &str) -> bool {
        self.is_kind_set(name, Kind::StringList)
    }

    pub fn is_choice_arg_set(&self, name: &str) -> bool {
        self.is_kind_set(name, Kind::Choice)
    }
}

fn fallback<T>(error: ArgError, value: T) -> T {
    tracing::error!("{}", error);
    value
}

/// Types readable from an option of a fixed kind.
pub trait FromArg<'a>: Sized {
    const KIND: Kind;

    fn from_descriptor(descriptor: &'a Descriptor) -> Option<Self>;
}

impl<'a> FromArg<'a> for bool {
    const KIND: Kind = Kind::Boolean;

    fn from_descriptor(descriptor: &'a Descriptor) -> Option<Self> {
        descriptor.as_bool()
    }
}

impl<'a> FromArg<'a> for i64 {
    const KIND: Kind = Kind::Integer;

    fn from_descriptor(descriptor: &'a Descriptor) -> Option<Self> {
        descriptor.as_integer()
    }
}

impl<'a> FromArg<'a> for f64 {
    const KIND: Kind = Kind::Real;

    fn from_descriptor(descriptor: &'a Descriptor) -> Option<Self> {
        descriptor.as_real()
    }
}

impl<'a> FromArg<'a> for &'a str {
    const KIND: Kind = Kind::String;

    fn from_descriptor(descriptor: &'a Descriptor) -> Option<Self> {
        descriptor.as_str()
    }
}

impl<'a> FromArg<'a> for String {
    const KIND: Kind = Kind::String;

    fn from_descriptor(descriptor: &'a Descriptor) -> Option<Self> {
        descriptor.as_str().map(str::to_string)
    }
}

impl<'a> FromArg<'a> for Vec<String> {
    const KIND: Kind = Kind::StringList;

    fn from_descriptor(descriptor: &'a Descriptor) -> Option<Self> {
        descriptor.as_list().map(<[String]>::to_vec)
    }
}
