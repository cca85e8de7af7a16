//! Reading a record: fields into slots, slots into a constructor call.

use alloc::string::ToString;

use recbind_core::{FieldReader, Path};

use crate::arguments::Arguments;
use crate::binding::{Binding, BindingTable};
use crate::error::DecodeError;
use crate::slots::SlotStore;

impl<T> BindingTable<T> {
    /// Decode one object into a `T`.
    ///
    /// Field order in the input does not matter. Unknown fields are skipped.
    /// A field seen twice, a null for a non-nullable property and a missing
    /// required property are all errors; nothing is constructed then.
    pub fn decode(&self, reader: &mut dyn FieldReader) -> Result<T, DecodeError> {
        let path = reader.path();
        let mut slots = SlotStore::new(self.bindings.len());
        self.read_fields(reader, &mut slots)?;
        self.fill_absent(&mut slots, &path)?;
        let mut leftovers = slots.split_off(self.arity());
        let mut value = self.construct(&mut slots, &path)?;
        self.apply_leftovers(&mut value, &mut leftovers, &path)?;
        Ok(value)
    }

    fn read_fields(
        &self,
        reader: &mut dyn FieldReader,
        slots: &mut SlotStore,
    ) -> Result<(), DecodeError> {
        reader.begin_object()?;
        while reader.has_next()? {
            let Some(index) = reader.select_name(&self.options)? else {
                reader.skip_name()?;
                trace!(type_name = self.type_name, path = %reader.path(), "skipping unknown field");
                reader.skip_value()?;
                continue;
            };
            let slot = self.lookup[index];
            let Some(binding) = self.binding(slot) else {
                reader.skip_value()?;
                continue;
            };
            if slots.contains(slot) {
                return Err(DecodeError::DuplicateField {
                    property: binding.name,
                    wire_name: binding.wire_name.to_string(),
                    path: reader.path(),
                });
            }
            let value = binding.converter.decode(reader)?;
            if value.is_none() && !binding.ty.is_nullable() {
                return Err(DecodeError::UnexpectedNull {
                    property: binding.name,
                    wire_name: binding.wire_name.to_string(),
                    path: reader.path(),
                });
            }
            trace!(field = binding.wire_name, slot, null = value.is_none(), "read field");
            slots.set(slot, value);
        }
        reader.end_object()?;
        Ok(())
    }

    /// Resolve constructor slots the input left out. A parameter without a
    /// default is missing. A nullable one with a default becomes null; a
    /// non-nullable one stays absent so its default applies.
    fn fill_absent(&self, slots: &mut SlotStore, path: &Path) -> Result<(), DecodeError> {
        for (index, param) in self.constructor.params().iter().enumerate() {
            if slots.contains(index) {
                continue;
            }
            if !param.is_optional() {
                let wire_name = self.binding(index).map_or(param.name(), Binding::wire_name);
                return Err(DecodeError::MissingProperty {
                    property: param.name(),
                    wire_name: wire_name.to_string(),
                    path: path.clone(),
                });
            }
            if param.ty().is_nullable() {
                slots.set(index, None);
            }
        }
        Ok(())
    }

    fn construct(&self, slots: &mut SlotStore, path: &Path) -> Result<T, DecodeError> {
        let mut args = Arguments::new(slots, self.constructor.params());
        trace!(type_name = self.type_name, mode = ?args.mode(), "invoking constructor");
        self.constructor
            .call(&mut args)
            .map_err(|source| DecodeError::Construct {
                type_name: self.type_name,
                source,
                path: path.clone(),
            })
    }

    fn apply_leftovers(
        &self,
        value: &mut T,
        leftovers: &mut SlotStore,
        path: &Path,
    ) -> Result<(), DecodeError> {
        let appended = self.bindings.iter().skip(self.arity()).flatten();
        for (offset, binding) in appended.enumerate() {
            let Some(decoded) = leftovers.take(offset).into_decoded() else {
                continue;
            };
            binding
                .accessor
                .set(value, decoded)
                .map_err(|source| DecodeError::Construct {
                    type_name: self.type_name,
                    source,
                    path: path.clone(),
                })?;
        }
        Ok(())
    }
}
