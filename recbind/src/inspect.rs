//! Turning a [`RecordShape`] into a [`BindingTable`].

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use recbind_core::NameOptions;

use crate::binding::{Binding, BindingTable};
use crate::error::ConfigError;
use crate::registry::Registry;
use crate::shape::{Parameter, Record, RecordShape};
use crate::types::{Qualifiers, TypeKind};

/// Build the binding table for `T`.
///
/// Returns `Ok(None)` when `T` has no primary constructor, so the registry
/// can try the next factory.
pub fn inspect<T: Record>(registry: &Registry) -> Result<Option<BindingTable<T>>, ConfigError> {
    inspect_shape(T::shape(), registry)
}

/// Build the binding table for an explicit shape.
pub fn inspect_shape<T: 'static>(
    shape: RecordShape<T>,
    registry: &Registry,
) -> Result<Option<BindingTable<T>>, ConfigError> {
    let type_name = shape.name();
    match shape.kind() {
        TypeKind::Class => {}
        kind => return Err(ConfigError::UnsupportedShape { type_name, kind }),
    }

    let (constructor, properties) = shape.into_parts();
    let Some(constructor) = constructor else {
        trace!(type_name, "no primary constructor");
        return Ok(None);
    };
    let params = constructor.params();
    check_defaults(type_name, params)?;

    let arity = params.len();
    let mut bindings: Vec<Option<Binding<T>>> = Vec::with_capacity(arity + properties.len());
    bindings.resize_with(arity, || None);
    let mut appended = Vec::new();
    let no_qualifiers = Qualifiers::new();
    let mut seen: Vec<&'static str> = Vec::with_capacity(properties.len());

    for property in properties {
        let name = property.name();
        if seen.contains(&name) {
            return Err(ConfigError::DuplicateProperty {
                type_name,
                property: name,
            });
        }
        seen.push(name);
        let parameter = params
            .iter()
            .position(|param| param.name() == name)
            .map(|index| (index, &params[index]));

        if property.is_transient() {
            if let Some((_, param)) = parameter
                && !param.is_optional()
            {
                return Err(ConfigError::MissingDefault {
                    type_name,
                    parameter: param.name(),
                });
            }
            trace!(type_name, property = name, "skipping transient property");
            continue;
        }

        if let Some((_, param)) = parameter
            && param.ty() != property.ty()
        {
            return Err(ConfigError::TypeMismatch {
                type_name,
                property: name,
                property_type: property.ty(),
                parameter_type: param.ty(),
            });
        }

        if parameter.is_none() && !property.is_settable() {
            trace!(type_name, property = name, "skipping read-only property");
            continue;
        }

        let wire_name = parameter
            .and_then(|(_, param)| param.renamed())
            .or(property.renamed())
            .unwrap_or(name);
        let param_qualifiers = parameter.map_or(&no_qualifiers, |(_, param)| param.qualifiers());
        let qualifiers = property.qualifiers().union(param_qualifiers);
        let ty = property.ty();

        let converter = registry
            .lookup(&ty, &qualifiers, &format!("{type_name}.{name}"))
            .map_err(|source| ConfigError::InProperty {
                type_name,
                property: name,
                source: Box::new(source),
            })?;

        let binding = Binding {
            name,
            wire_name,
            ty,
            converter,
            accessor: property.into_accessor(),
            slot: 0,
        };
        match parameter {
            Some((index, _)) => bindings[index] = Some(Binding { slot: index, ..binding }),
            None => appended.push(binding),
        }
    }

    for (index, param) in params.iter().enumerate() {
        if bindings[index].is_none() && !param.is_optional() {
            return Err(ConfigError::NoSourceForParameter {
                type_name,
                parameter: param.name(),
            });
        }
    }

    for binding in appended {
        let slot = bindings.len();
        bindings.push(Some(Binding { slot, ..binding }));
    }

    let options = NameOptions::new(bindings.iter().flatten().map(|binding| binding.wire_name))
        .map_err(|duplicate| duplicate_wire_name(type_name, &bindings, duplicate.0))?;
    let lookup: Vec<usize> = bindings.iter().flatten().map(|binding| binding.slot).collect();

    debug!(
        type_name,
        arity,
        slots = bindings.len(),
        fields = lookup.len(),
        "built binding table"
    );

    Ok(Some(BindingTable {
        type_name,
        constructor,
        bindings,
        lookup,
        options,
    }))
}

/// Every default must produce the parameter's type, and may only produce
/// null for a nullable parameter.
fn check_defaults(type_name: &'static str, params: &[Parameter]) -> Result<(), ConfigError> {
    for param in params {
        let Some(found) = param.default_type() else {
            continue;
        };
        let expected = param.ty();
        if found.id() != expected.id() || (found.is_nullable() && !expected.is_nullable()) {
            return Err(ConfigError::DefaultTypeMismatch {
                type_name,
                parameter: param.name(),
                expected,
                found,
            });
        }
    }
    Ok(())
}

fn duplicate_wire_name<T>(
    type_name: &'static str,
    bindings: &[Option<Binding<T>>],
    wire_name: String,
) -> ConfigError {
    let mut holders = bindings
        .iter()
        .flatten()
        .filter(|binding| binding.wire_name == wire_name)
        .map(|binding| binding.name);
    let first = holders.next().unwrap_or_default();
    let second = holders.next().unwrap_or_default();
    ConfigError::DuplicateWireName {
        type_name,
        wire_name,
        first,
        second,
    }
}
