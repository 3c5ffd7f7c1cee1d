//! Ordered binding of parsed options into caller variables.

use crate::descriptor::{Descriptor, Kind};
use crate::registry::Args;
use thiserror::Error;

/// Errors that can occur while binding options to slots.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("slot {position} expects {expected} but option {name} is {actual}")]
    KindMismatch {
        position: usize,
        name: String,
        expected: Kind,
        actual: Kind,
    },

    #[error("too few slots: {needed} options to bind, {given} slots given")]
    TooFewSlots { needed: usize, given: usize },
}

/// A typed output location for one option.
#[derive(Debug)]
pub enum Slot<'a> {
    Bool(&'a mut bool),
    Integer(&'a mut i64),
    Real(&'a mut f64),
    String(&'a mut String),
    StringList(&'a mut Vec<String>),
    /// Receives the index of the selected choice
    Choice(&'a mut i64),
}

impl Slot<'_> {
    pub fn kind(&self) -> Kind {
        match self {
            Slot::Bool(_) => Kind::Boolean,
            Slot::Integer(_) => Kind::Integer,
            Slot::Real(_) => Kind::Real,
            Slot::String(_) => Kind::String,
            Slot::StringList(_) => Kind::StringList,
            Slot::Choice(_) => Kind::Choice,
        }
    }

    fn store(&mut self, descriptor: &Descriptor) {
        match self {
            Slot::Bool(out) => {
                if let Some(v) = descriptor.as_bool() {
                    **out = v;
                }
            }
            Slot::Integer(out) => {
                if let Some(v) = descriptor.as_integer() {
                    **out = v;
                }
            }
            Slot::Real(out) => {
                if let Some(v) = descriptor.as_real() {
                    **out = v;
                }
            }
            Slot::String(out) => {
                if let Some(v) = descriptor.as_str() {
                    **out = v.to_string();
                }
            }
            Slot::StringList(out) => {
                if let Some(v) = descriptor.as_list() {
                    **out = v.to_vec();
                }
            }
            Slot::Choice(out) => {
                if let Some(v) = descriptor.as_choice() {
                    **out = v;
                }
            }
        }
    }
}

/// Copy option values into `slots`, pairing them in declaration order.
///
/// Options flagged skip take no slot. Slots beyond the last option are left
/// alone. Nothing is written unless every pairing has matching kinds.
pub fn bind(descriptors: &[Descriptor], slots: &mut [Slot<'_>]) -> Result<(), BindError> {
    let bound: Vec<&Descriptor> = descriptors.iter().filter(|d| !d.is_skip()).collect();

    if slots.len() < bound.len() {
        return Err(BindError::TooFewSlots {
            needed: bound.len(),
            given: slots.len(),
        });
    }

    for (position, (descriptor, slot)) in bound.iter().zip(slots.iter()).enumerate() {
        if descriptor.kind() != slot.kind() {
            return Err(BindError::KindMismatch {
                position,
                name: descriptor.name().to_string(),
                expected: slot.kind(),
                actual: descriptor.kind(),
            });
        }
    }

    for (descriptor, slot) in bound.into_iter().zip(slots.iter_mut()) {
        slot.store(descriptor);
    }

    Ok(())
}

impl Args {
    /// Copy the current option values into `slots`. See [`bind`].
    pub fn bind(&self, slots: &mut [Slot<'_>]) -> Result<(), BindError> {
        bind(self.descriptors(), slots)
    }

    /// Parse `args`, then bind the values into `slots`.
    ///
    /// Returns the parse outcome; binding happens whether or not every
    /// required option was present.
    pub fn parse_into<S: AsRef<str>>(
        &mut self,
        args: &[S],
        slots: &mut [Slot<'_>],
    ) -> Result<bool, BindError> {
        let success = self.parse(args);
        self.bind(slots)?;
        Ok(success)
    }
}
