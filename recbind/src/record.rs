//! The record converter and the factory that builds it from a shape.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;
use core::marker::PhantomData;

use recbind_core::{FieldReader, FieldWriter};

use crate::binding::BindingTable;
use crate::converter::{Converter, ConverterFactory, Decoded, expect_value, read_null};
use crate::error::{ConfigError, DecodeError, EncodeError};
use crate::inspect::inspect;
use crate::registry::Registry;
use crate::shape::Record;
use crate::types::{Qualifiers, TypeRef};

/// Reads and writes one record type through its [`BindingTable`].
pub struct RecordConverter<T> {
    table: Arc<BindingTable<T>>,
}

impl<T> RecordConverter<T> {
    /// Wrap a built table.
    pub fn new(table: BindingTable<T>) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    /// The table this converter reads and writes through.
    pub fn table(&self) -> &BindingTable<T> {
        &self.table
    }
}

impl<T: Any + Send> Converter for RecordConverter<T> {
    fn decode(&self, reader: &mut dyn FieldReader) -> Result<Decoded, DecodeError> {
        if read_null(reader)? {
            return Ok(None);
        }
        let value = self.table.decode(reader)?;
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
        let value = expect_value::<T>(writer, value)?;
        self.table.encode(writer, value)
    }
}

/// Builds [`RecordConverter`]s for `T`.
///
/// Consults the registry's generated converters first. Declines qualified
/// lookups and types without a primary constructor.
pub struct RecordFactory<T> {
    _record: PhantomData<fn() -> T>,
}

impl<T> RecordFactory<T> {
    /// A factory for `T`.
    pub const fn new() -> Self {
        Self {
            _record: PhantomData,
        }
    }
}

impl<T> Default for RecordFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> ConverterFactory for RecordFactory<T> {
    fn create(
        &self,
        ty: &TypeRef,
        qualifiers: &Qualifiers,
        registry: &Registry,
    ) -> Result<Option<Arc<dyn Converter>>, ConfigError> {
        if !ty.is::<T>() || !qualifiers.is_empty() {
            return Ok(None);
        }
        if let Some(converter) = registry.generated().get(ty.id()) {
            trace!(ty = %ty, "using generated converter");
            return Ok(Some(converter));
        }
        Ok(inspect::<T>(registry)?
            .map(|table| Arc::new(RecordConverter::new(table)) as Arc<dyn Converter>))
    }
}
