//! Compilation of option definition strings into descriptors.
//!
//! A definition string is a whitespace separated list of records:
//!
//! ```text
//! -<name>[:<kind>[<choices>][<count>][<flags>]][=<default>] [(<description>)]
//! ```
//!
//! Kind letters are `f` (flag), `i`/`I` (integer), `r`/`R` (real),
//! `s`/`S` (string) and `c`/`C` (choice, followed by `[a,b,c]`). Upper
//! case kinds take their value attached to the option token (`-I42`).
//! Flag letters are `n` (no case), `r` (required), `s` (skip) and
//! `m` (multiple).

use crate::descriptor::{ArgValue, Descriptor, Flags, Kind};
use crate::value;
use thiserror::Error;

/// Errors that can occur while compiling a definition string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("invalid character '{found}' at position {position}")]
    InvalidCharacter { found: char, position: usize },

    #[error("unexpected end of definition at position {position}")]
    UnexpectedEnd { position: usize },

    #[error("invalid option kind '{found}' at position {position}")]
    InvalidKind { found: char, position: usize },

    #[error("missing choices for option {name}: expected '[' after the kind letter")]
    MissingChoices { name: String },

    #[error("invalid value for count: {count}")]
    InvalidCount { count: String },

    #[error("invalid {kind} default '{value}' for option {name}")]
    InvalidDefault {
        name: String,
        kind: Kind,
        value: String,
    },

    #[error("multiple values not supported for option {name}")]
    MultipleNotSupported { name: String },
}

/// Compile a definition string into descriptors, in declaration order.
pub fn compile(spec: &str) -> Result<Vec<Descriptor>, DefinitionError> {
    let mut descriptors = Vec::new();
    compile_into(spec, &mut descriptors)?;
    Ok(descriptors)
}

/// Compile a definition string, appending descriptors to `out`.
///
/// Compilation stops at the first malformed record; descriptors compiled
/// before it stay in `out`.
pub fn compile_into(spec: &str, out: &mut Vec<Descriptor>) -> Result<(), DefinitionError> {
    let mut compiler = Compiler::new(spec);

    loop {
        compiler.skip_whitespace();
        if compiler.at_end() {
            return Ok(());
        }

        let descriptor = compiler.record()?;
        tracing::debug!(
            name = descriptor.name(),
            kind = %descriptor.kind(),
            attached = descriptor.is_attached(),
            "compiled option"
        );
        out.push(descriptor);
    }
}

/// Raw pieces of one record before the descriptor is built.
struct Record {
    name: String,
    kind: Kind,
    attached: bool,
    count: usize,
    flags: Flags,
    choices: Vec<String>,
    default: String,
    description: String,
}

/// Internal compiler state.
struct Compiler {
    chars: Vec<char>,
    pos: usize,
}

impl Compiler {
    fn new(spec: &str) -> Self {
        Self {
            chars: spec.chars().collect(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn invalid(&self) -> DefinitionError {
        match self.peek() {
            Some(found) => DefinitionError::InvalidCharacter {
                found,
                position: self.pos,
            },
            None => DefinitionError::UnexpectedEnd { position: self.pos },
        }
    }

    fn record(&mut self) -> Result<Descriptor, DefinitionError> {
        let name = self.name()?;

        let mut record = Record {
            name,
            kind: Kind::Boolean,
            attached: false,
            count: 1,
            flags: Flags::default(),
            choices: Vec::new(),
            default: String::new(),
            description: String::new(),
        };

        if self.peek() == Some(':') {
            self.pos += 1;
            self.kind(&mut record)?;
        }

        if self.peek() == Some('=') {
            self.pos += 1;
            record.default = self.escaped_until(char::is_whitespace);
        }

        // The description may be separated from the rest by whitespace.
        let mut look = self.pos;
        while self.chars.get(look).is_some_and(|c| c.is_whitespace()) {
            look += 1;
        }
        if self.chars.get(look) == Some(&'(') {
            self.pos = look + 1;
            record.description = self.escaped_until(|c| c == ')');
            if self.peek() == Some(')') {
                self.pos += 1;
            }
        }

        if self.peek().is_some_and(|c| !c.is_whitespace()) {
            return Err(self.invalid());
        }

        build(record)
    }

    /// Dash run followed by an alphanumeric and then alphanumerics or '_'.
    fn name(&mut self) -> Result<String, DefinitionError> {
        let start = self.pos;

        if self.peek() != Some('-') {
            return Err(self.invalid());
        }
        while self.peek() == Some('-') {
            self.pos += 1;
        }

        if !self.peek().is_some_and(|c| c.is_ascii_alphanumeric()) {
            return Err(self.invalid());
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.pos += 1;
        }

        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn kind(&mut self, record: &mut Record) -> Result<(), DefinitionError> {
        let letter = self.peek().ok_or(DefinitionError::UnexpectedEnd { position: self.pos })?;

        record.kind = match letter {
            'f' => Kind::Boolean,
            'i' | 'I' => Kind::Integer,
            'r' | 'R' => Kind::Real,
            's' | 'S' => Kind::String,
            'c' | 'C' => Kind::Choice,
            found => {
                return Err(DefinitionError::InvalidKind {
                    found,
                    position: self.pos,
                })
            }
        };
        record.attached = letter.is_ascii_uppercase();
        self.pos += 1;

        if record.kind == Kind::Choice {
            record.choices = self.choices(&record.name)?;
        }

        if self.peek().is_some_and(|c| c.is_ascii_digit()) {
            let start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
            let text: String = self.chars[start..self.pos].iter().collect();
            record.count = match text.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(DefinitionError::InvalidCount { count: text }),
            };
        }

        while let Some(letter) = self.peek() {
            match letter {
                'n' => record.flags.no_case = true,
                'r' => record.flags.required = true,
                's' => record.flags.skip = true,
                'm' => record.flags.multiple = true,
                _ => break,
            }
            self.pos += 1;
        }

        Ok(())
    }

    /// Bracketed list of labels separated by spaces or commas. An
    /// unterminated list runs to the end of the definition.
    fn choices(&mut self, name: &str) -> Result<Vec<String>, DefinitionError> {
        if self.peek() != Some('[') {
            return Err(DefinitionError::MissingChoices {
                name: name.to_string(),
            });
        }
        self.pos += 1;

        let start = self.pos;
        while self.peek().is_some_and(|c| c != ']') {
            self.pos += 1;
        }
        let list: String = self.chars[start..self.pos].iter().collect();

        if self.peek() == Some(']') {
            self.pos += 1;
        }

        Ok(list
            .split([' ', ','])
            .filter(|word| !word.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Read text up to a terminator; a backslash takes the next character
    /// literally.
    fn escaped_until(&mut self, stop: impl Fn(char) -> bool) -> String {
        let mut text = String::new();

        while let Some(c) = self.peek() {
            if stop(c) {
                break;
            }
            self.pos += 1;
            if c == '\\' {
                if let Some(next) = self.peek() {
                    text.push(next);
                    self.pos += 1;
                }
            } else {
                text.push(c);
            }
        }

        text
    }
}

fn build(record: Record) -> Result<Descriptor, DefinitionError> {
    let Record {
        name,
        kind,
        attached,
        count,
        flags,
        choices,
        default,
        description,
    } = record;

    let list = kind == Kind::String && flags.multiple;
    if count != 1 && !list {
        return Err(DefinitionError::MultipleNotSupported { name });
    }

    let invalid_default = |kind: Kind| DefinitionError::InvalidDefault {
        name: name.clone(),
        kind,
        value: default.clone(),
    };

    let value = match kind {
        Kind::Boolean => {
            let v = if default.is_empty() {
                false
            } else {
                value::to_bool(&default).ok_or_else(|| invalid_default(kind))?
            };
            ArgValue::boolean(v)
        }
        Kind::Integer => {
            let v = if default.is_empty() {
                0
            } else {
                value::to_integer(&default).ok_or_else(|| invalid_default(kind))?
            };
            ArgValue::integer(v)
        }
        Kind::Real => {
            let v = if default.is_empty() {
                0.0
            } else {
                value::to_real(&default).ok_or_else(|| invalid_default(kind))?
            };
            ArgValue::real(v)
        }
        Kind::String if list => ArgValue::string_list(default.clone()),
        Kind::String | Kind::StringList => ArgValue::string(default.clone()),
        Kind::Choice => {
            // An index, or one of the declared labels.
            let v = if default.is_empty() {
                0
            } else if let Some(index) = value::to_integer(&default) {
                index
            } else {
                choices
                    .iter()
                    .position(|c| *c == default)
                    .map(|index| index as i64)
                    .ok_or_else(|| invalid_default(kind))?
            };
            ArgValue::choice(choices, v)
        }
    };

    Ok(Descriptor::new(name, flags, attached, description, value))
}
