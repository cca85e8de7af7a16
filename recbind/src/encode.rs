//! Writing a record.

use recbind_core::FieldWriter;

use crate::binding::BindingTable;
use crate::error::EncodeError;

impl<T> BindingTable<T> {
    /// Encode `value` as one object, fields in table order.
    pub fn encode(&self, writer: &mut dyn FieldWriter, value: &T) -> Result<(), EncodeError> {
        writer.begin_object()?;
        for binding in self.bindings() {
            writer.name(binding.wire_name)?;
            binding
                .converter
                .encode(writer, binding.accessor.get(value))?;
        }
        writer.end_object()?;
        Ok(())
    }
}
