//! The converter contracts: one value in, one value out.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;

use recbind_core::{FieldReader, FieldWriter, Token};

use crate::error::{ConfigError, DecodeError, EncodeError};
use crate::registry::Registry;
use crate::types::{Qualifiers, TypeRef};

/// A decoded value with its type erased; `None` is a decoded null.
pub type Decoded = Option<Box<dyn Any + Send>>;

/// Reads and writes values of one type.
///
/// Converters are null-safe: a null in the stream decodes to `None`, and
/// encoding `None` writes a null. Whether null is *acceptable* is decided by
/// whoever holds the converter.
pub trait Converter: Send + Sync {
    /// Read one value.
    fn decode(&self, reader: &mut dyn FieldReader) -> Result<Decoded, DecodeError>;

    /// Write one value. `value` must be of the converter's type.
    fn encode(
        &self,
        writer: &mut dyn FieldWriter,
        value: Option<&dyn Any>,
    ) -> Result<(), EncodeError>;
}

/// A strategy for building converters, tried in registry order.
///
/// Returning `Ok(None)` means "not mine"; the registry moves on to the next
/// factory. Errors stop the lookup.
pub trait ConverterFactory: Send + Sync {
    /// Build a converter for `ty` (never nullable) with `qualifiers`.
    fn create(
        &self,
        ty: &TypeRef,
        qualifiers: &Qualifiers,
        registry: &Registry,
    ) -> Result<Option<Arc<dyn Converter>>, ConfigError>;
}

impl<F> ConverterFactory for F
where
    F: Fn(&TypeRef, &Qualifiers, &Registry) -> Result<Option<Arc<dyn Converter>>, ConfigError>
        + Send
        + Sync,
{
    fn create(
        &self,
        ty: &TypeRef,
        qualifiers: &Qualifiers,
        registry: &Registry,
    ) -> Result<Option<Arc<dyn Converter>>, ConfigError> {
        self(ty, qualifiers, registry)
    }
}

/// Consume a null if one is next. Converters call this first.
pub fn read_null(reader: &mut dyn FieldReader) -> Result<bool, DecodeError> {
    if reader.peek()? == Token::Null {
        reader.next_null()?;
        return Ok(true);
    }
    Ok(false)
}

/// Downcast a value handed to [`Converter::encode`].
pub fn expect_value<'a, V: Any>(
    writer: &dyn FieldWriter,
    value: &'a dyn Any,
) -> Result<&'a V, EncodeError> {
    value
        .downcast_ref::<V>()
        .ok_or_else(|| EncodeError::WrongType {
            expected: core::any::type_name::<V>(),
            path: writer.path(),
        })
}
