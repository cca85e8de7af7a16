//! Converters for `Vec<V>`, registered per element type.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;
use core::marker::PhantomData;

use recbind_core::{FieldReader, FieldWriter, StreamError, StreamErrorKind, Token};

use crate::converter::{Converter, ConverterFactory, Decoded, expect_value, read_null};
use crate::error::{ConfigError, DecodeError, EncodeError};
use crate::registry::Registry;
use crate::types::{Qualifiers, TypeRef};

/// Reads and writes `Vec<V>` as an array, delegating elements to the
/// converter for `V`. Elements may not be null.
pub struct ListConverter<V> {
    element: Arc<dyn Converter>,
    _element: PhantomData<fn() -> V>,
}

impl<V> ListConverter<V> {
    /// A list converter using `element` for each item.
    pub fn new(element: Arc<dyn Converter>) -> Self {
        Self {
            element,
            _element: PhantomData,
        }
    }
}

impl<V: Any + Send> Converter for ListConverter<V> {
    fn decode(&self, reader: &mut dyn FieldReader) -> Result<Decoded, DecodeError> {
        if read_null(reader)? {
            return Ok(None);
        }
        let mut items = Vec::new();
        reader.begin_array()?;
        while reader.has_next()? {
            let path = reader.path();
            let Some(item) = self.element.decode(reader)? else {
                return Err(StreamError::new(
                    StreamErrorKind::UnexpectedToken {
                        expected: "a non-null element",
                        got: Token::Null,
                    },
                    path,
                )
                .into());
            };
            let item = item.downcast::<V>().map_err(|_| DecodeError::WrongType {
                expected: core::any::type_name::<V>(),
                path,
            })?;
            items.push(*item);
        }
        reader.end_array()?;
        Ok(Some(Box::new(items)))
    }

    fn encode(
        &self,
        writer: &mut dyn FieldWriter,
        value: Option<&dyn Any>,
    ) -> Result<(), EncodeError> {
        let Some(value) = value else {
            return Ok(writer.null_value()?);
        };
        let items = expect_value::<Vec<V>>(writer, value)?;
        writer.begin_array()?;
        for item in items {
            self.element.encode(writer, Some(item as &dyn Any))?;
        }
        writer.end_array()?;
        Ok(())
    }
}

/// Produces [`ListConverter`]s for `Vec<V>`.
pub struct ListFactory<V> {
    _element: PhantomData<fn() -> V>,
}

impl<V> ListFactory<V> {
    /// A factory for `Vec<V>`.
    pub const fn new() -> Self {
        Self {
            _element: PhantomData,
        }
    }
}

impl<V> Default for ListFactory<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Any + Send> ConverterFactory for ListFactory<V> {
    fn create(
        &self,
        ty: &TypeRef,
        qualifiers: &Qualifiers,
        registry: &Registry,
    ) -> Result<Option<Arc<dyn Converter>>, ConfigError> {
        if !ty.is::<Vec<V>>() || !qualifiers.is_empty() {
            return Ok(None);
        }
        let element = registry.lookup(&TypeRef::of::<V>(), &Qualifiers::new(), ty.name())?;
        Ok(Some(Arc::new(ListConverter::<V>::new(element))))
    }
}
