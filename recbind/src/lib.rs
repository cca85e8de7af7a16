#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

extern crate alloc;

/// Trace-level logging macro that forwards to `tracing::trace!` when the `tracing` feature is enabled.
#[cfg(feature = "tracing")]
#[allow(unused_macros)]
macro_rules! trace {
    ($($arg:tt)*) => {
        ::tracing::trace!($($arg)*)
    };
}

/// Trace-level logging macro (no-op when `tracing` feature is disabled).
#[cfg(not(feature = "tracing"))]
#[allow(unused_macros)]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

/// Debug-level logging macro that forwards to `tracing::debug!` when the `tracing` feature is enabled.
#[cfg(feature = "tracing")]
#[allow(unused_macros)]
macro_rules! debug {
    ($($arg:tt)*) => {
        ::tracing::debug!($($arg)*)
    };
}

/// Debug-level logging macro (no-op when `tracing` feature is disabled).
#[cfg(not(feature = "tracing"))]
#[allow(unused_macros)]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

mod adapter;
mod arguments;
mod binding;
mod converter;
mod decode;
mod encode;
mod error;
mod inspect;
mod list;
mod record;
mod registry;
mod shape;
mod slots;
mod standard;
mod types;

pub use adapter::Adapter;
pub use arguments::{ArgumentError, Arguments, CallMode};
pub use binding::{Binding, BindingTable};
pub use converter::{Converter, ConverterFactory, Decoded, expect_value, read_null};
pub use error::{ConfigError, DecodeError, EncodeError};
pub use inspect::{inspect, inspect_shape};
pub use list::{ListConverter, ListFactory};
pub use record::{RecordConverter, RecordFactory};
pub use registry::{GeneratedConverters, Registry, RegistryBuilder};
pub use shape::{
    Constructor, ConstructorBuilder, NullablePropertyDef, Parameter, Property, PropertyDef, Record,
    RecordShape, RecordShapeBuilder,
};
pub use slots::{Slot, SlotStore};
pub use standard::{Scalar, StandardFactory};
pub use types::{Qualifiers, TypeKind, TypeRef};

pub use recbind_core::{
    FieldReader, FieldWriter, NameOptions, Path, PathSegment, StreamError, StreamErrorKind, Token,
};

#[cfg(feature = "json")]
pub use recbind_json::{JsonReader, JsonWriter, SerializeOptions};
