//! Compiled option descriptors and their per-kind value handling.

use crate::value;
use serde::Serialize;
use std::fmt;

/// The kind of value an option carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// A flag with no value (e.g., -v)
    Boolean,
    /// A signed integer value
    Integer,
    /// A double precision value
    Real,
    /// A single text value
    String,
    /// Text values accumulated across repeated occurrences
    StringList,
    /// One label out of a declared list, stored as its index
    Choice,
}

impl Kind {
    /// Human readable kind name, as used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Boolean => "Boolean",
            Kind::Integer => "Integer",
            Kind::Real => "Real",
            Kind::String => "String",
            Kind::StringList => "String List",
            Kind::Choice => "Choice",
        }
    }

    /// Placeholder shown in the usage synopsis, `None` for flags.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            Kind::Boolean => None,
            Kind::Integer => Some("<integer>"),
            Kind::Real => Some("<real>"),
            Kind::String | Kind::StringList => Some("<string>"),
            Kind::Choice => Some("<choice>"),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-option flags, set from the `n`, `r`, `s` and `m` flag letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Flags {
    /// Match the option name case-insensitively
    pub no_case: bool,
    /// The option must be supplied
    pub required: bool,
    /// Keep the option and its values in the compacted argument list
    pub skip: bool,
    /// The option may be repeated, accumulating values
    pub multiple: bool,
}

/// Current and default value of a descriptor, one case per kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArgValue {
    Boolean {
        value: bool,
        default: bool,
    },
    Integer {
        value: i64,
        default: i64,
    },
    Real {
        value: f64,
        default: f64,
    },
    String {
        value: String,
        default: String,
    },
    StringList {
        values: Vec<String>,
        default: String,
        /// True while `values` still holds only the declared default
        #[serde(skip)]
        defaulted: bool,
    },
    Choice {
        value: i64,
        default: i64,
        choices: Vec<String>,
    },
}

impl ArgValue {
    pub fn boolean(default: bool) -> Self {
        ArgValue::Boolean {
            value: default,
            default,
        }
    }

    pub fn integer(default: i64) -> Self {
        ArgValue::Integer {
            value: default,
            default,
        }
    }

    pub fn real(default: f64) -> Self {
        ArgValue::Real {
            value: default,
            default,
        }
    }

    pub fn string(default: impl Into<String>) -> Self {
        let default = default.into();
        ArgValue::String {
            value: default.clone(),
            default,
        }
    }

    /// A list starts out holding the default as its only entry, or empty
    /// when no default was declared.
    pub fn string_list(default: impl Into<String>) -> Self {
        let default = default.into();
        let values = if default.is_empty() {
            Vec::new()
        } else {
            vec![default.clone()]
        };
        ArgValue::StringList {
            values,
            defaulted: !default.is_empty(),
            default,
        }
    }

    pub fn choice(choices: Vec<String>, default: i64) -> Self {
        ArgValue::Choice {
            value: default,
            default,
            choices,
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            ArgValue::Boolean { .. } => Kind::Boolean,
            ArgValue::Integer { .. } => Kind::Integer,
            ArgValue::Real { .. } => Kind::Real,
            ArgValue::String { .. } => Kind::String,
            ArgValue::StringList { .. } => Kind::StringList,
            ArgValue::Choice { .. } => Kind::Choice,
        }
    }

    /// Assign from raw text. Only the first entry of `args` is used; flags
    /// ignore it entirely. Returns false (leaving the value untouched) when
    /// the text is not valid for the kind.
    fn assign(&mut self, args: &[&str]) -> bool {
        if let ArgValue::Boolean { value, .. } = self {
            *value = true;
            return true;
        }

        let Some(text) = args.first().copied() else {
            return false;
        };

        match self {
            ArgValue::Boolean { .. } => true,
            ArgValue::Integer { value, .. } => match value::to_integer(text) {
                Some(v) => {
                    *value = v;
                    true
                }
                None => false,
            },
            ArgValue::Real { value, .. } => match value::to_real(text) {
                Some(v) => {
                    *value = v;
                    true
                }
                None => false,
            },
            ArgValue::String { value, .. } => {
                *value = text.to_string();
                true
            }
            ArgValue::StringList {
                values, defaulted, ..
            } => {
                if *defaulted {
                    values.clear();
                    *defaulted = false;
                }
                values.push(text.to_string());
                true
            }
            ArgValue::Choice { value, choices, .. } => {
                match choices.iter().position(|c| c == text) {
                    Some(index) => {
                        *value = index as i64;
                        true
                    }
                    None => false,
                }
            }
        }
    }
}

/// One declared option.
#[derive(Debug, Clone)]
pub struct Descriptor {
    name: String,
    flags: Flags,
    attached: bool,
    description: String,
    value: ArgValue,
    set: bool,
}

impl Descriptor {
    /// Create a descriptor. Flags are never attached, whatever is requested.
    pub fn new(
        name: impl Into<String>,
        flags: Flags,
        attached: bool,
        description: impl Into<String>,
        value: ArgValue,
    ) -> Self {
        let attached = attached && value.kind() != Kind::Boolean;
        Self {
            name: name.into(),
            flags,
            attached,
            description: description.into(),
            value,
            set: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Kind {
        self.value.kind()
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn is_required(&self) -> bool {
        self.flags.required
    }

    pub fn is_skip(&self) -> bool {
        self.flags.skip
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn value(&self) -> &ArgValue {
        &self.value
    }

    /// Whether a value was assigned since the last reset.
    pub fn is_set(&self) -> bool {
        self.set
    }

    pub fn reset_set(&mut self) {
        self.set = false;
    }

    /// Whether this is a `-x` style flag usable inside a flag cluster.
    pub fn is_short_flag(&self) -> bool {
        self.kind() == Kind::Boolean && self.name.len() == 2
    }

    /// The letter a short flag answers to inside a cluster.
    pub fn short_letter(&self) -> Option<char> {
        if self.is_short_flag() {
            self.name[1..].chars().next()
        } else {
            None
        }
    }

    /// Number of raw value tokens one occurrence consumes.
    pub fn arity(&self) -> usize {
        match self.kind() {
            Kind::Boolean => 0,
            _ => 1,
        }
    }

    /// Number of tokens following the option token that one occurrence
    /// consumes. Attached values live inside the option token itself.
    pub fn following_count(&self) -> usize {
        if self.attached {
            0
        } else {
            self.arity()
        }
    }

    /// Test a command line token against this option.
    ///
    /// Unattached options need the whole token to equal the name; attached
    /// options need the token to be strictly longer than the name and start
    /// with it.
    pub fn option_matches(&self, token: &str) -> bool {
        if !self.attached {
            return self.name_matches(token);
        }

        if token.len() <= self.name.len() {
            return false;
        }

        let prefix = &token.as_bytes()[..self.name.len()];
        if self.flags.no_case {
            prefix.eq_ignore_ascii_case(self.name.as_bytes())
        } else {
            prefix == self.name.as_bytes()
        }
    }

    /// Test a lookup name against this option's name.
    pub fn name_matches(&self, name: &str) -> bool {
        if self.flags.no_case {
            name.eq_ignore_ascii_case(&self.name)
        } else {
            name == self.name
        }
    }

    /// Assign a value from a matched option token and the tokens after it.
    ///
    /// For attached options the text after the name inside `option` is
    /// passed as the first value. Updates the set flag to the outcome.
    pub fn set_value(&mut self, option: &str, following: &[&str]) -> bool {
        self.set = if self.attached {
            let inline = option.get(self.name.len()..).unwrap_or("");
            let mut args = Vec::with_capacity(following.len() + 1);
            args.push(inline);
            args.extend_from_slice(following);
            self.value.assign(&args)
        } else {
            self.value.assign(following)
        };
        self.set
    }

    pub fn as_bool(&self) -> Option<bool> {
        match &self.value {
            ArgValue::Boolean { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match &self.value {
            ArgValue::Integer { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match &self.value {
            ArgValue::Real { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            ArgValue::String { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match &self.value {
            ArgValue::StringList { values, .. } => Some(values),
            _ => None,
        }
    }

    pub fn as_choice(&self) -> Option<i64> {
        match &self.value {
            ArgValue::Choice { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Declared labels of a choice option.
    pub fn choices(&self) -> &[String] {
        match &self.value {
            ArgValue::Choice { choices, .. } => choices,
            _ => &[],
        }
    }
}
