use alloc::string::String;
use core::fmt;

use crate::{NameOptions, Path, StreamError};

/// Kind of the next element in a field stream, as reported by [`FieldReader::peek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// Start of an object.
    BeginObject,
    /// End of the current object.
    EndObject,
    /// Start of an array.
    BeginArray,
    /// End of the current array.
    EndArray,
    /// A field name inside an object.
    Name,
    /// A string value.
    String,
    /// A numeric value.
    Number,
    /// `true` or `false`.
    Bool,
    /// An explicit null.
    Null,
    /// End of the document.
    EndDocument,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Token::BeginObject => "BEGIN_OBJECT",
            Token::EndObject => "END_OBJECT",
            Token::BeginArray => "BEGIN_ARRAY",
            Token::EndArray => "END_ARRAY",
            Token::Name => "NAME",
            Token::String => "STRING",
            Token::Number => "NUMBER",
            Token::Bool => "BOOLEAN",
            Token::Null => "NULL",
            Token::EndDocument => "END_DOCUMENT",
        })
    }
}

/// Pull reader over a structured document.
///
/// The trait is object safe: converters receive `&mut dyn FieldReader` so a
/// single converter works with every wire format.
pub trait FieldReader {
    /// Consume the start of an object.
    fn begin_object(&mut self) -> Result<(), StreamError>;

    /// Consume the end of the current object.
    fn end_object(&mut self) -> Result<(), StreamError>;

    /// Consume the start of an array.
    fn begin_array(&mut self) -> Result<(), StreamError>;

    /// Consume the end of the current array.
    fn end_array(&mut self) -> Result<(), StreamError>;

    /// True if the current object or array has another element.
    fn has_next(&mut self) -> Result<bool, StreamError>;

    /// Kind of the next element, without consuming it.
    fn peek(&mut self) -> Result<Token, StreamError>;

    /// Match the next field name against `options`.
    ///
    /// On a match the name is consumed and its index returned. Otherwise the
    /// name stays pending and `Ok(None)` is returned; the caller either
    /// consumes it with [`skip_name`](Self::skip_name) or reads it with
    /// [`next_name`](Self::next_name).
    fn select_name(&mut self, options: &NameOptions) -> Result<Option<usize>, StreamError>;

    /// Consume the next field name and return it.
    fn next_name(&mut self) -> Result<String, StreamError>;

    /// Consume the next field name without decoding it.
    fn skip_name(&mut self) -> Result<(), StreamError>;

    /// Consume the next value, including any nested objects or arrays.
    fn skip_value(&mut self) -> Result<(), StreamError>;

    /// Consume an explicit null.
    fn next_null(&mut self) -> Result<(), StreamError>;

    /// Consume a boolean.
    fn next_bool(&mut self) -> Result<bool, StreamError>;

    /// Consume a string.
    fn next_string(&mut self) -> Result<String, StreamError>;

    /// Consume a number that fits in an `i64`.
    fn next_i64(&mut self) -> Result<i64, StreamError>;

    /// Consume a number that fits in a `u64`.
    fn next_u64(&mut self) -> Result<u64, StreamError>;

    /// Consume a number as an `f64`.
    fn next_f64(&mut self) -> Result<f64, StreamError>;

    /// Current position in the document, for error messages.
    fn path(&self) -> Path;
}
