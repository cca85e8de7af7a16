//! The binding table: how a record's fields map to constructor slots.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use recbind_core::NameOptions;

use crate::converter::Converter;
use crate::shape::{Accessor, Constructor};
use crate::types::TypeRef;

/// One wire field of a record.
pub struct Binding<T> {
    pub(crate) name: &'static str,
    pub(crate) wire_name: &'static str,
    pub(crate) ty: TypeRef,
    pub(crate) converter: Arc<dyn Converter>,
    pub(crate) accessor: Accessor<T>,
    pub(crate) slot: usize,
}

impl<T> Binding<T> {
    /// The property's name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The field name on the wire.
    pub const fn wire_name(&self) -> &'static str {
        self.wire_name
    }

    /// The declared type.
    pub const fn ty(&self) -> TypeRef {
        self.ty
    }

    /// The slot this binding fills during decode.
    pub const fn slot(&self) -> usize {
        self.slot
    }

    /// Whether the value is written through a setter after construction.
    pub fn is_settable(&self) -> bool {
        self.accessor.is_settable()
    }
}

impl<T> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("name", &self.name)
            .field("wire_name", &self.wire_name)
            .field("ty", &self.ty)
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

/// Everything needed to decode and encode one record type.
///
/// `bindings` is indexed by slot: constructor parameters first (`None` for a
/// parameter that is never read from the wire), then settable properties
/// that are not constructor parameters. Immutable once built.
pub struct BindingTable<T> {
    pub(crate) type_name: &'static str,
    pub(crate) constructor: Constructor<T>,
    pub(crate) bindings: Vec<Option<Binding<T>>>,
    /// `NameOptions` index to slot.
    pub(crate) lookup: Vec<usize>,
    pub(crate) options: NameOptions,
}

impl<T> BindingTable<T> {
    /// The record's name.
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Number of constructor parameters.
    pub fn arity(&self) -> usize {
        self.constructor.arity()
    }

    /// Number of slots, constructor and appended.
    pub fn slot_count(&self) -> usize {
        self.bindings.len()
    }

    /// The binding for `slot`; `None` for placeholders and out-of-range slots.
    pub fn binding(&self, slot: usize) -> Option<&Binding<T>> {
        self.bindings.get(slot).and_then(Option::as_ref)
    }

    /// The bindings in table order, placeholders skipped.
    pub fn bindings(&self) -> impl Iterator<Item = &Binding<T>> {
        self.bindings.iter().flatten()
    }

    /// The compiled wire names, in lookup order.
    pub const fn names(&self) -> &NameOptions {
        &self.options
    }
}

impl<T> fmt::Debug for BindingTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingTable")
            .field("type_name", &self.type_name)
            .field("arity", &self.arity())
            .field("bindings", &self.bindings)
            .finish_non_exhaustive()
    }
}
