//! Converters for scalars: booleans, integers, floats, strings and chars.

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use core::any::Any;

use recbind_core::{FieldReader, FieldWriter, StreamError, StreamErrorKind};

use crate::converter::{Converter, ConverterFactory, Decoded, expect_value, read_null};
use crate::error::{ConfigError, DecodeError, EncodeError};
use crate::registry::Registry;
use crate::types::{Qualifiers, TypeRef};

type ReadFn<V> = fn(&mut dyn FieldReader) -> Result<V, StreamError>;
type WriteFn<V> = fn(&mut dyn FieldWriter, &V) -> Result<(), StreamError>;

/// A converter for one scalar type, built from a read and a write function.
pub struct Scalar<V> {
    read: ReadFn<V>,
    write: WriteFn<V>,
}

impl<V> Scalar<V> {
    /// Wrap a pair of stream functions.
    pub const fn new(read: ReadFn<V>, write: WriteFn<V>) -> Self {
        Self { read, write }
    }
}

impl<V: Any + Send> Converter for Scalar<V> {
    fn decode(&self, reader: &mut dyn FieldReader) -> Result<Decoded, DecodeError> {
        if read_null(reader)? {
            return Ok(None);
        }
        let value = (self.read)(reader)?;
        Ok(Some(Box::new(value)))
    }

    fn encode(
        &self,
        writer: &mut dyn FieldWriter,
        value: Option<&dyn Any>,
    ) -> Result<(), EncodeError> {
        let Some(value) = value else {
            return Ok(writer.null_value()?);
        };
        let value = expect_value::<V>(writer, value)?;
        Ok((self.write)(writer, value)?)
    }
}

fn out_of_range(reader: &dyn FieldReader, value: impl ToString, target: &'static str) -> StreamError {
    StreamError::new(
        StreamErrorKind::NumberOutOfRange {
            value: value.to_string(),
            target,
        },
        reader.path(),
    )
}

macro_rules! signed {
    ($name:ident, $t:ty) => {
        fn $name() -> Scalar<$t> {
            Scalar::new(
                |reader| {
                    let n = reader.next_i64()?;
                    <$t>::try_from(n).map_err(|_| out_of_range(reader, n, stringify!($t)))
                },
                |writer, v| writer.i64_value(i64::from(*v)),
            )
        }
    };
}

macro_rules! unsigned {
    ($name:ident, $t:ty) => {
        fn $name() -> Scalar<$t> {
            Scalar::new(
                |reader| {
                    let n = reader.next_u64()?;
                    <$t>::try_from(n).map_err(|_| out_of_range(reader, n, stringify!($t)))
                },
                |writer, v| writer.u64_value(u64::from(*v)),
            )
        }
    };
}

signed!(i8_converter, i8);
signed!(i16_converter, i16);
signed!(i32_converter, i32);
signed!(i64_converter, i64);
unsigned!(u8_converter, u8);
unsigned!(u16_converter, u16);
unsigned!(u32_converter, u32);
unsigned!(u64_converter, u64);

fn bool_converter() -> Scalar<bool> {
    Scalar::new(|reader| reader.next_bool(), |writer, v| writer.bool_value(*v))
}

fn f64_converter() -> Scalar<f64> {
    Scalar::new(|reader| reader.next_f64(), |writer, v| writer.f64_value(*v))
}

fn f32_converter() -> Scalar<f32> {
    Scalar::new(
        |reader| {
            let n = reader.next_f64()?;
            let narrowed = n as f32;
            if narrowed.is_infinite() && n.is_finite() {
                return Err(out_of_range(reader, n, "f32"));
            }
            Ok(narrowed)
        },
        |writer, v| writer.f64_value(f64::from(*v)),
    )
}

fn string_converter() -> Scalar<String> {
    Scalar::new(|reader| reader.next_string(), |writer, v| writer.string_value(v))
}

fn char_converter() -> Scalar<char> {
    Scalar::new(
        |reader| {
            let text = reader.next_string()?;
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(StreamError::new(
                    StreamErrorKind::InvalidValue {
                        message: alloc::format!("expected a char but was \"{text}\""),
                    },
                    reader.path(),
                )),
            }
        },
        |writer, v| writer.string_value(v.encode_utf8(&mut [0; 4])),
    )
}

/// Serves the scalar types. Declines qualified lookups.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardFactory;

impl StandardFactory {
    fn converter_for(ty: &TypeRef) -> Option<Arc<dyn Converter>> {
        macro_rules! first_match {
            ($($t:ty => $make:expr),* $(,)?) => {
                $(
                    if ty.is::<$t>() {
                        return Some(Arc::new($make));
                    }
                )*
            };
        }
        first_match! {
            bool => bool_converter(),
            i8 => i8_converter(),
            i16 => i16_converter(),
            i32 => i32_converter(),
            i64 => i64_converter(),
            u8 => u8_converter(),
            u16 => u16_converter(),
            u32 => u32_converter(),
            u64 => u64_converter(),
            f32 => f32_converter(),
            f64 => f64_converter(),
            char => char_converter(),
            String => string_converter(),
        }
        None
    }
}

impl ConverterFactory for StandardFactory {
    fn create(
        &self,
        ty: &TypeRef,
        qualifiers: &Qualifiers,
        _registry: &Registry,
    ) -> Result<Option<Arc<dyn Converter>>, ConfigError> {
        if !qualifiers.is_empty() {
            return Ok(None);
        }
        Ok(Self::converter_for(ty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recbind_json::{JsonReader, JsonWriter};

    fn decode_one<V: Any + Copy>(converter: &dyn Converter, json: &str) -> Result<Option<V>, DecodeError> {
        let mut reader = JsonReader::new(json);
        let decoded = converter.decode(&mut reader)?;
        Ok(decoded.map(|value| *value.downcast::<V>().unwrap()))
    }

    #[test]
    fn narrow_integers_are_range_checked() {
        let converter = StandardFactory::converter_for(&TypeRef::of::<u8>()).unwrap();
        assert_eq!(decode_one::<u8>(&*converter, "255"), Ok(Some(255)));
        let err = decode_one::<u8>(&*converter, "256").unwrap_err();
        insta::assert_snapshot!(err, @"number `256` out of range for u8 at $");

        let converter = StandardFactory::converter_for(&TypeRef::of::<i16>()).unwrap();
        assert_eq!(decode_one::<i16>(&*converter, "-300"), Ok(Some(-300)));
    }

    #[test]
    fn nulls_decode_to_none() {
        let converter = StandardFactory::converter_for(&TypeRef::of::<bool>()).unwrap();
        assert_eq!(decode_one::<bool>(&*converter, "null"), Ok(None));
        assert_eq!(decode_one::<bool>(&*converter, "true"), Ok(Some(true)));
    }

    #[test]
    fn chars_must_be_single_characters() {
        let converter = StandardFactory::converter_for(&TypeRef::of::<char>()).unwrap();
        assert_eq!(decode_one::<char>(&*converter, "\"é\""), Ok(Some('é')));
        assert!(decode_one::<char>(&*converter, "\"ab\"").is_err());
    }

    #[test]
    fn encode_refuses_foreign_values() {
        let converter = StandardFactory::converter_for(&TypeRef::of::<String>()).unwrap();
        let mut writer = JsonWriter::new();
        let err = converter.encode(&mut writer, Some(&5i32)).unwrap_err();
        assert!(matches!(err, EncodeError::WrongType { .. }));
    }

    #[test]
    fn unknown_types_are_declined() {
        assert!(StandardFactory::converter_for(&TypeRef::of::<Vec<u8>>()).is_none());
    }
}
