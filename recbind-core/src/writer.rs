use crate::{Path, StreamError};

/// Push writer for a structured document.
///
/// Object safe, like [`FieldReader`](crate::FieldReader).
pub trait FieldWriter {
    /// Open an object.
    fn begin_object(&mut self) -> Result<(), StreamError>;

    /// Write the name of the next field of the current object.
    fn name(&mut self, name: &str) -> Result<(), StreamError>;

    /// Close the current object.
    fn end_object(&mut self) -> Result<(), StreamError>;

    /// Open an array.
    fn begin_array(&mut self) -> Result<(), StreamError>;

    /// Close the current array.
    fn end_array(&mut self) -> Result<(), StreamError>;

    /// Write an explicit null.
    fn null_value(&mut self) -> Result<(), StreamError>;

    /// Write a boolean.
    fn bool_value(&mut self, value: bool) -> Result<(), StreamError>;

    /// Write a string.
    fn string_value(&mut self, value: &str) -> Result<(), StreamError>;

    /// Write a signed integer.
    fn i64_value(&mut self, value: i64) -> Result<(), StreamError>;

    /// Write an unsigned integer.
    fn u64_value(&mut self, value: u64) -> Result<(), StreamError>;

    /// Write a float. Non-finite values are refused.
    fn f64_value(&mut self, value: f64) -> Result<(), StreamError>;

    /// Current position in the document, for error messages.
    fn path(&self) -> Path;
}
