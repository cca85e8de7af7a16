use alloc::string::String;
use core::fmt;

use crate::{Path, Token};

/// Error raised by a field stream reader or writer.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamError {
    /// What went wrong.
    pub kind: StreamErrorKind,
    /// Where in the document it went wrong.
    pub path: Path,
    /// Byte offset into the input, when the stream knows it.
    pub offset: Option<usize>,
}

impl StreamError {
    /// Create an error at `path` without offset information.
    pub const fn new(kind: StreamErrorKind, path: Path) -> Self {
        Self {
            kind,
            path,
            offset: None,
        }
    }

    /// Attach a byte offset.
    pub const fn at_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind, self.path)?;
        if let Some(offset) = self.offset {
            write!(f, " (offset {offset})")?;
        }
        Ok(())
    }
}

impl std::error::Error for StreamError {}

/// Specific stream failures.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamErrorKind {
    /// The next element is not the one the caller asked for.
    UnexpectedToken {
        /// What the caller wanted.
        expected: &'static str,
        /// What the stream holds instead.
        got: Token,
    },
    /// The input is not well-formed.
    Syntax {
        /// Description of the malformation.
        message: String,
    },
    /// A number does not fit the requested representation.
    NumberOutOfRange {
        /// The number as written in the input.
        value: String,
        /// The requested representation.
        target: &'static str,
    },
    /// A value was read successfully but is not acceptable for its target.
    InvalidValue {
        /// Why the value was refused.
        message: String,
    },
    /// Floats must be finite to be written.
    NonFiniteNumber(f64),
    /// Input continues after the root value.
    TrailingData,
    /// Containers are nested deeper than the stream allows.
    NestingTooDeep {
        /// The deepest nesting accepted.
        limit: usize,
    },
    /// Calls arrived in an order the stream cannot honor.
    InvalidState {
        /// Which rule was broken.
        message: &'static str,
    },
}

impl fmt::Display for StreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamErrorKind::UnexpectedToken { expected, got } => {
                write!(f, "expected {expected} but was {got}")
            }
            StreamErrorKind::Syntax { message } => write!(f, "malformed input: {message}"),
            StreamErrorKind::NumberOutOfRange { value, target } => {
                write!(f, "number `{value}` out of range for {target}")
            }
            StreamErrorKind::InvalidValue { message } => write!(f, "invalid value: {message}"),
            StreamErrorKind::NonFiniteNumber(value) => {
                write!(f, "numeric values must be finite, but was {value}")
            }
            StreamErrorKind::TrailingData => f.write_str("document has trailing data"),
            StreamErrorKind::NestingTooDeep { limit } => {
                write!(f, "nesting too deep (more than {limit} levels)")
            }
            StreamErrorKind::InvalidState { message } => write!(f, "invalid stream state: {message}"),
        }
    }
}

impl StreamErrorKind {
    /// Stable error code for diagnostics.
    pub const fn code(&self) -> &'static str {
        match self {
            StreamErrorKind::UnexpectedToken { .. } => "recbind::stream::unexpected_token",
            StreamErrorKind::Syntax { .. } => "recbind::stream::syntax",
            StreamErrorKind::NumberOutOfRange { .. } => "recbind::stream::number_out_of_range",
            StreamErrorKind::InvalidValue { .. } => "recbind::stream::invalid_value",
            StreamErrorKind::NonFiniteNumber(_) => "recbind::stream::non_finite_number",
            StreamErrorKind::TrailingData => "recbind::stream::trailing_data",
            StreamErrorKind::NestingTooDeep { .. } => "recbind::stream::nesting_too_deep",
            StreamErrorKind::InvalidState { .. } => "recbind::stream::invalid_state",
        }
    }
}

/// Two entries of a [`NameOptions`](crate::NameOptions) share a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateName(pub String);

impl fmt::Display for DuplicateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "name `{}` appears more than once", self.0)
    }
}

impl std::error::Error for DuplicateName {}
