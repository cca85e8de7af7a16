//! Typed access to decoded constructor arguments.

use alloc::string::String;
use core::any::Any;
use core::fmt;

use crate::converter::Decoded;
use crate::shape::Parameter;
use crate::slots::{Slot, SlotStore};

/// A constructor or setter could not use the value it was given.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ArgumentError {
    /// The parameter was not supplied and has no default.
    Missing {
        /// The parameter's name.
        parameter: &'static str,
    },
    /// The parameter was null but read as non-nullable.
    UnexpectedNull {
        /// The parameter's name.
        parameter: &'static str,
    },
    /// The parameter holds a value of another type than requested.
    WrongType {
        /// The parameter's name.
        parameter: &'static str,
        /// The requested type.
        expected: &'static str,
    },
    /// No parameter at this index.
    OutOfBounds {
        /// The requested index.
        index: usize,
    },
    /// The constructor refused the arguments for its own reasons.
    Custom(String),
}

impl ArgumentError {
    /// A constructor-specific failure.
    pub fn custom(message: impl fmt::Display) -> Self {
        ArgumentError::Custom(message.to_string())
    }
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentError::Missing { parameter } => {
                write!(f, "parameter '{parameter}' has no value and no default")
            }
            ArgumentError::UnexpectedNull { parameter } => {
                write!(f, "parameter '{parameter}' is null")
            }
            ArgumentError::WrongType {
                parameter,
                expected,
            } => write!(f, "parameter '{parameter}' is not a {expected}"),
            ArgumentError::OutOfBounds { index } => write!(f, "no parameter at index {index}"),
            ArgumentError::Custom(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for ArgumentError {}

/// How the decoder is calling the constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    /// Every parameter slot is filled, from the input or as a null.
    Positional,
    /// Some parameters are absent and take their defaults.
    Keyed,
}

/// The arguments for one constructor call.
///
/// Each parameter can be taken once. Absent parameters evaluate their
/// declared default when taken.
pub struct Arguments<'a> {
    slots: &'a mut SlotStore,
    params: &'a [Parameter],
    mode: CallMode,
}

impl<'a> Arguments<'a> {
    pub(crate) fn new(slots: &'a mut SlotStore, params: &'a [Parameter]) -> Self {
        let mode = if slots.is_fully_initialized() {
            CallMode::Positional
        } else {
            CallMode::Keyed
        };
        Self {
            slots,
            params,
            mode,
        }
    }

    /// Number of constructor parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether the constructor takes no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Whether every parameter came from the input.
    pub const fn mode(&self) -> CallMode {
        self.mode
    }

    /// Whether parameter `index` came from the input (as a value or a null).
    pub fn is_present(&self, index: usize) -> bool {
        self.slots.contains(index)
    }

    /// Take parameter `index` as a `V`, refusing null.
    pub fn take<V: Any>(&mut self, index: usize) -> Result<V, ArgumentError> {
        let parameter = self.parameter_name(index)?;
        match self.take_raw(index)? {
            Some(value) => downcast(parameter, value),
            None => Err(ArgumentError::UnexpectedNull { parameter }),
        }
    }

    /// Take parameter `index` as an optional `V`.
    pub fn take_nullable<V: Any>(&mut self, index: usize) -> Result<Option<V>, ArgumentError> {
        let parameter = self.parameter_name(index)?;
        self.take_raw(index)?
            .map(|value| downcast(parameter, value))
            .transpose()
    }

    fn parameter_name(&self, index: usize) -> Result<&'static str, ArgumentError> {
        self.params
            .get(index)
            .map(Parameter::name)
            .ok_or(ArgumentError::OutOfBounds { index })
    }

    fn take_raw(&mut self, index: usize) -> Result<Decoded, ArgumentError> {
        let parameter = self
            .params
            .get(index)
            .ok_or(ArgumentError::OutOfBounds { index })?;
        match self.slots.take(index) {
            Slot::Value(value) => Ok(Some(value)),
            Slot::Null => Ok(None),
            Slot::Absent => parameter
                .evaluate_default()
                .ok_or(ArgumentError::Missing {
                    parameter: parameter.name(),
                }),
        }
    }
}

fn downcast<V: Any>(
    parameter: &'static str,
    value: alloc::boxed::Box<dyn Any + Send>,
) -> Result<V, ArgumentError> {
    value
        .downcast::<V>()
        .map(|value| *value)
        .map_err(|_| ArgumentError::WrongType {
            parameter,
            expected: core::any::type_name::<V>(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::boxed::Box;

    fn params() -> [Parameter; 3] {
        [
            Parameter::of::<i64>("a"),
            Parameter::of::<String>("b").default_value(|| String::from("x")),
            Parameter::nullable::<String>("c"),
        ]
    }

    #[test]
    fn present_values_are_taken_positionally() {
        let params = params();
        let mut slots = SlotStore::new(3);
        slots.set(0, Some(Box::new(1i64)));
        slots.set(1, Some(Box::new(String::from("y"))));
        slots.set(2, None);
        let mut args = Arguments::new(&mut slots, &params);
        assert_eq!(args.mode(), CallMode::Positional);
        assert_eq!(args.take::<i64>(0), Ok(1));
        assert_eq!(args.take::<String>(1).as_deref(), Ok("y"));
        assert_eq!(args.take_nullable::<String>(2), Ok(None));
    }

    #[test]
    fn absent_values_take_their_default() {
        let params = params();
        let mut slots = SlotStore::new(3);
        slots.set(0, Some(Box::new(1i64)));
        slots.set(2, None);
        let mut args = Arguments::new(&mut slots, &params);
        assert_eq!(args.mode(), CallMode::Keyed);
        assert!(!args.is_present(1));
        assert_eq!(args.take::<String>(1).as_deref(), Ok("x"));
    }

    #[test]
    fn misuse_is_reported() {
        let params = params();
        let mut slots = SlotStore::new(3);
        slots.set(2, None);
        let mut args = Arguments::new(&mut slots, &params);
        assert_eq!(
            args.take::<i64>(0),
            Err(ArgumentError::Missing { parameter: "a" })
        );
        assert_eq!(
            args.take::<String>(2),
            Err(ArgumentError::UnexpectedNull { parameter: "c" })
        );
        assert_eq!(
            args.take::<u8>(1),
            Err(ArgumentError::WrongType {
                parameter: "b",
                expected: "u8"
            })
        );
        assert_eq!(
            args.take::<u8>(9),
            Err(ArgumentError::OutOfBounds { index: 9 })
        );
    }
}
