//! Error types for binding setup, decoding and encoding.

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt::{self, Display};

use recbind_core::{Path, StreamError};

use crate::arguments::ArgumentError;
use crate::types::{Qualifiers, TypeKind, TypeRef};

/// A type cannot be bound, raised once when its converter is built.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    /// The type's kind cannot be constructed through a primary constructor.
    UnsupportedShape {
        /// The record's name.
        type_name: &'static str,
        /// Why it was refused.
        kind: TypeKind,
    },
    /// A property and its constructor parameter disagree on type.
    TypeMismatch {
        /// The record's name.
        type_name: &'static str,
        /// The property's name.
        property: &'static str,
        /// The property's declared type.
        property_type: TypeRef,
        /// The parameter's declared type.
        parameter_type: TypeRef,
    },
    /// A transient property feeds a constructor parameter with no default.
    MissingDefault {
        /// The record's name.
        type_name: &'static str,
        /// The parameter's name.
        parameter: &'static str,
    },
    /// A required constructor parameter has no property to read it from.
    NoSourceForParameter {
        /// The record's name.
        type_name: &'static str,
        /// The parameter's name.
        parameter: &'static str,
    },
    /// Two bindings use the same wire name.
    DuplicateWireName {
        /// The record's name.
        type_name: &'static str,
        /// The shared wire name.
        wire_name: String,
        /// The binding declared first.
        first: &'static str,
        /// The binding declared second.
        second: &'static str,
    },
    /// The same property name was registered twice.
    DuplicateProperty {
        /// The record's name.
        type_name: &'static str,
        /// The repeated name.
        property: &'static str,
    },
    /// A parameter's default produces a value of another type.
    DefaultTypeMismatch {
        /// The record's name.
        type_name: &'static str,
        /// The parameter's name.
        parameter: &'static str,
        /// The parameter's declared type.
        expected: TypeRef,
        /// The type the default produces.
        found: TypeRef,
    },
    /// No factory in the registry produced a converter.
    NoConverter {
        /// The requested type.
        ty: TypeRef,
        /// The requested qualifiers.
        qualifiers: Qualifiers,
    },
    /// Resolving a property's converter failed.
    InProperty {
        /// The record's name.
        type_name: &'static str,
        /// The property's name.
        property: &'static str,
        /// The underlying failure.
        source: Box<ConfigError>,
    },
}

impl ConfigError {
    /// Returns an error code for this error.
    pub const fn code(&self) -> &'static str {
        match self {
            ConfigError::UnsupportedShape { .. } => "recbind::config::unsupported_shape",
            ConfigError::TypeMismatch { .. } => "recbind::config::type_mismatch",
            ConfigError::MissingDefault { .. } => "recbind::config::missing_default",
            ConfigError::NoSourceForParameter { .. } => "recbind::config::no_source_for_parameter",
            ConfigError::DuplicateWireName { .. } => "recbind::config::duplicate_wire_name",
            ConfigError::DuplicateProperty { .. } => "recbind::config::duplicate_property",
            ConfigError::DefaultTypeMismatch { .. } => "recbind::config::default_type_mismatch",
            ConfigError::NoConverter { .. } => "recbind::config::no_converter",
            ConfigError::InProperty { .. } => "recbind::config::in_property",
        }
    }

    /// The innermost error, looking through [`ConfigError::InProperty`].
    pub fn root_cause(&self) -> &ConfigError {
        match self {
            ConfigError::InProperty { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnsupportedShape { type_name, kind } => match kind {
                TypeKind::SealedRoot => write!(
                    f,
                    "cannot bind sealed type {type_name}; register a converter for it by hand"
                ),
                _ => write!(f, "cannot bind {} {type_name}", kind.describe()),
            },
            ConfigError::TypeMismatch {
                type_name,
                property,
                property_type,
                parameter_type,
            } => write!(
                f,
                "'{property}' on {type_name} has a constructor parameter of type \
                 {parameter_type} but a property of type {property_type}"
            ),
            ConfigError::MissingDefault {
                type_name,
                parameter,
            } => write!(
                f,
                "no default value for transient constructor parameter '{parameter}' on {type_name}"
            ),
            ConfigError::NoSourceForParameter {
                type_name,
                parameter,
            } => write!(
                f,
                "no property for required constructor parameter '{parameter}' on {type_name}"
            ),
            ConfigError::DuplicateWireName {
                type_name,
                wire_name,
                first,
                second,
            } => write!(
                f,
                "'{first}' and '{second}' on {type_name} both use the field name '{wire_name}'"
            ),
            ConfigError::DuplicateProperty {
                type_name,
                property,
            } => write!(f, "property '{property}' is registered twice on {type_name}"),
            ConfigError::DefaultTypeMismatch {
                type_name,
                parameter,
                expected,
                found,
            } => write!(
                f,
                "default for '{parameter}' on {type_name} produces {found}, expected {expected}"
            ),
            ConfigError::NoConverter { ty, qualifiers } => {
                write!(f, "no converter for {ty}")?;
                if !qualifiers.is_empty() {
                    write!(f, " qualified with {qualifiers}")?;
                }
                Ok(())
            }
            ConfigError::InProperty {
                type_name,
                property,
                source,
            } => write!(f, "{type_name}.{property}: {source}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InProperty { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl miette::Diagnostic for ConfigError {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new(ConfigError::code(self)))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        match self {
            ConfigError::MissingDefault { parameter, .. } => Some(Box::new(format!(
                "give '{parameter}' a default value or stop marking its property transient"
            ))),
            ConfigError::NoConverter { .. } => Some(Box::new(
                "register the type with RegistryBuilder::record, ::list or ::add",
            )),
            _ => None,
        }
    }
}

/// Names a property in messages, adding the wire name when it differs.
struct PropertyName<'a> {
    property: &'a str,
    wire_name: &'a str,
}

impl Display for PropertyName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.property)?;
        if self.property != self.wire_name {
            write!(f, " (field '{}')", self.wire_name)?;
        }
        Ok(())
    }
}

/// Decoding a value failed. Decodes never produce partial values.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum DecodeError {
    /// The same field appeared twice in one object.
    DuplicateField {
        /// The property's name.
        property: &'static str,
        /// The field name in the input.
        wire_name: String,
        /// Where the second occurrence was read.
        path: Path,
    },
    /// A non-nullable property was given an explicit null.
    UnexpectedNull {
        /// The property's name.
        property: &'static str,
        /// The field name in the input.
        wire_name: String,
        /// Where the null was read.
        path: Path,
    },
    /// A required property never appeared.
    MissingProperty {
        /// The property's name.
        property: &'static str,
        /// The field name in the input.
        wire_name: String,
        /// The object that lacks it.
        path: Path,
    },
    /// The field stream failed.
    Stream(StreamError),
    /// The constructor or a setter refused its arguments.
    Construct {
        /// The record's name.
        type_name: &'static str,
        /// What the constructor reported.
        source: ArgumentError,
        /// The object that was being decoded.
        path: Path,
    },
    /// A converter produced a value of another type than declared.
    WrongType {
        /// The declared type.
        expected: &'static str,
        /// Where the value was read.
        path: Path,
    },
    /// A converter for a recursive type was used before it was built.
    Unresolved {
        /// The type whose converter was pending.
        type_name: &'static str,
    },
}

impl DecodeError {
    /// Returns an error code for this error.
    pub const fn code(&self) -> &'static str {
        match self {
            DecodeError::DuplicateField { .. } => "recbind::decode::duplicate_field",
            DecodeError::UnexpectedNull { .. } => "recbind::decode::unexpected_null",
            DecodeError::MissingProperty { .. } => "recbind::decode::missing_property",
            DecodeError::Stream(err) => err.kind.code(),
            DecodeError::Construct { .. } => "recbind::decode::construct",
            DecodeError::WrongType { .. } => "recbind::decode::wrong_type",
            DecodeError::Unresolved { .. } => "recbind::decode::unresolved",
        }
    }

    /// Where in the input the failure happened, when known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            DecodeError::DuplicateField { path, .. }
            | DecodeError::UnexpectedNull { path, .. }
            | DecodeError::MissingProperty { path, .. }
            | DecodeError::Construct { path, .. }
            | DecodeError::WrongType { path, .. } => Some(path),
            DecodeError::Stream(err) => Some(&err.path),
            DecodeError::Unresolved { .. } => None,
        }
    }
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::DuplicateField {
                property,
                wire_name,
                path,
            } => {
                let name = PropertyName {
                    property,
                    wire_name,
                };
                write!(f, "multiple values for {name} at {path}")
            }
            DecodeError::UnexpectedNull {
                property,
                wire_name,
                path,
            } => {
                let name = PropertyName {
                    property,
                    wire_name,
                };
                write!(f, "non-null value {name} was null at {path}")
            }
            DecodeError::MissingProperty {
                property,
                wire_name,
                path,
            } => {
                let name = PropertyName {
                    property,
                    wire_name,
                };
                write!(f, "required value {name} missing at {path}")
            }
            DecodeError::Stream(err) => write!(f, "{err}"),
            DecodeError::Construct {
                type_name,
                source,
                path,
            } => write!(f, "cannot construct {type_name} at {path}: {source}"),
            DecodeError::WrongType { expected, path } => {
                write!(f, "converter did not produce a {expected} at {path}")
            }
            DecodeError::Unresolved { type_name } => {
                write!(f, "converter for {type_name} was used before it was built")
            }
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Stream(err) => Some(err),
            DecodeError::Construct { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl miette::Diagnostic for DecodeError {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new(DecodeError::code(self)))
    }
}

impl From<StreamError> for DecodeError {
    fn from(err: StreamError) -> Self {
        DecodeError::Stream(err)
    }
}

/// Encoding a value failed.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum EncodeError {
    /// The field stream refused a write.
    Stream(StreamError),
    /// A converter was handed a value of another type than declared.
    WrongType {
        /// The declared type.
        expected: &'static str,
        /// Where the value was being written.
        path: Path,
    },
    /// A converter for a recursive type was used before it was built.
    Unresolved {
        /// The type whose converter was pending.
        type_name: &'static str,
    },
}

impl EncodeError {
    /// Returns an error code for this error.
    pub const fn code(&self) -> &'static str {
        match self {
            EncodeError::Stream(err) => err.kind.code(),
            EncodeError::WrongType { .. } => "recbind::encode::wrong_type",
            EncodeError::Unresolved { .. } => "recbind::encode::unresolved",
        }
    }
}

impl Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::Stream(err) => write!(f, "{err}"),
            EncodeError::WrongType { expected, path } => {
                write!(f, "converter for {expected} was given another type at {path}")
            }
            EncodeError::Unresolved { type_name } => {
                write!(f, "converter for {type_name} was used before it was built")
            }
        }
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EncodeError::Stream(err) => Some(err),
            _ => None,
        }
    }
}

impl miette::Diagnostic for EncodeError {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new(EncodeError::code(self)))
    }
}

impl From<StreamError> for EncodeError {
    fn from(err: StreamError) -> Self {
        EncodeError::Stream(err)
    }
}
