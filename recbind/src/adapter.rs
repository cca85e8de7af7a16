//! Typed entry points over a type-erased [`Converter`].

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;
use core::marker::PhantomData;

use recbind_core::{FieldReader, FieldWriter, Path, StreamError, StreamErrorKind, Token};

use crate::converter::Converter;
use crate::error::{DecodeError, EncodeError};

#[cfg(feature = "json")]
use alloc::{string::String, vec::Vec};
#[cfg(feature = "json")]
use recbind_json::{JsonReader, JsonWriter, SerializeOptions};

/// Reads and writes `T`, obtained from [`Registry::adapter`](crate::Registry::adapter).
pub struct Adapter<T> {
    converter: Arc<dyn Converter>,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for Adapter<T> {
    fn clone(&self) -> Self {
        Self {
            converter: Arc::clone(&self.converter),
            _value: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Adapter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Adapter")
            .field(&core::any::type_name::<T>())
            .finish()
    }
}

impl<T: Any + Send> Adapter<T> {
    pub(crate) fn new(converter: Arc<dyn Converter>) -> Self {
        Self {
            converter,
            _value: PhantomData,
        }
    }

    /// The underlying converter.
    pub fn converter(&self) -> &Arc<dyn Converter> {
        &self.converter
    }

    /// Read one `T`. A null is an error.
    pub fn decode(&self, reader: &mut dyn FieldReader) -> Result<T, DecodeError> {
        if reader.peek()? == Token::Null {
            return Err(StreamError::new(
                StreamErrorKind::UnexpectedToken {
                    expected: "a value",
                    got: Token::Null,
                },
                reader.path(),
            )
            .into());
        }
        let path = reader.path();
        match self.converter.decode(reader)? {
            Some(value) => downcast(value, path),
            None => Err(DecodeError::WrongType {
                expected: core::any::type_name::<T>(),
                path,
            }),
        }
    }

    /// Read one `T` or a null.
    pub fn decode_nullable(&self, reader: &mut dyn FieldReader) -> Result<Option<T>, DecodeError> {
        let path = reader.path();
        self.converter
            .decode(reader)?
            .map(|value| downcast(value, path))
            .transpose()
    }

    /// Write `value`.
    pub fn encode(&self, writer: &mut dyn FieldWriter, value: &T) -> Result<(), EncodeError> {
        self.converter.encode(writer, Some(value as &dyn Any))
    }

    /// Write `value`, or a null for `None`.
    pub fn encode_nullable(
        &self,
        writer: &mut dyn FieldWriter,
        value: Option<&T>,
    ) -> Result<(), EncodeError> {
        self.converter
            .encode(writer, value.map(|value| value as &dyn Any))
    }
}

#[cfg(feature = "json")]
impl<T: Any + Send> Adapter<T> {
    /// Parse a JSON document holding one `T`.
    pub fn from_json(&self, input: &str) -> Result<T, DecodeError> {
        let mut reader = JsonReader::new(input);
        let value = self.decode(&mut reader)?;
        reader.finish()?;
        Ok(value)
    }

    /// Parse a JSON document holding one `T` or `null`.
    pub fn from_json_nullable(&self, input: &str) -> Result<Option<T>, DecodeError> {
        let mut reader = JsonReader::new(input);
        let value = self.decode_nullable(&mut reader)?;
        reader.finish()?;
        Ok(value)
    }

    /// Parse JSON bytes holding one `T`.
    pub fn from_slice(&self, input: &[u8]) -> Result<T, DecodeError> {
        let mut reader = JsonReader::from_slice(input);
        let value = self.decode(&mut reader)?;
        reader.finish()?;
        Ok(value)
    }

    /// Compact JSON for `value`.
    pub fn to_json(&self, value: &T) -> Result<String, EncodeError> {
        self.to_json_with(value, SerializeOptions::new())
    }

    /// Indented JSON for `value`.
    pub fn to_json_pretty(&self, value: &T) -> Result<String, EncodeError> {
        self.to_json_with(value, SerializeOptions::new().pretty())
    }

    /// JSON for `value` with explicit options.
    pub fn to_json_with(&self, value: &T, options: SerializeOptions) -> Result<String, EncodeError> {
        let mut writer = JsonWriter::with_options(options);
        self.encode(&mut writer, value)?;
        Ok(writer.finish_string()?)
    }

    /// JSON bytes for `value`.
    pub fn to_vec(&self, value: &T) -> Result<Vec<u8>, EncodeError> {
        let mut writer = JsonWriter::new();
        self.encode(&mut writer, value)?;
        Ok(writer.finish()?)
    }
}

fn downcast<T: Any>(value: Box<dyn Any + Send>, path: Path) -> Result<T, DecodeError> {
    value
        .downcast::<T>()
        .map(|value| *value)
        .map_err(|_| DecodeError::WrongType {
            expected: core::any::type_name::<T>(),
            path,
        })
}
