//! Record shapes: what a type exposes to the binder.
//!
//! A [`RecordShape`] lists the type's kind, its primary constructor and its
//! properties. Getters and setters are typed closures; the shape erases them
//! so bindings can be built without knowing property types statically.
//!
//! ```rust,ignore
//! impl Record for Point {
//!     fn shape() -> RecordShape<Self> {
//!         RecordShape::builder("Point")
//!             .constructor(
//!                 Constructor::builder()
//!                     .param(Parameter::of::<i64>("x"))
//!                     .param(Parameter::of::<i64>("y").default_value(|| 0))
//!                     .build(|args| Ok(Point { x: args.take(0)?, y: args.take(1)? })),
//!             )
//!             .property(Property::new("x", |p: &Point| &p.x))
//!             .property(Property::new("y", |p: &Point| &p.y))
//!             .build()
//!     }
//! }
//! ```

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;
use core::marker::PhantomData;

use crate::arguments::{ArgumentError, Arguments};
use crate::converter::Decoded;
use crate::types::{Qualifiers, TypeKind, TypeRef};

/// A type that describes its own shape.
pub trait Record: Sized + Send + Sync + 'static {
    /// The shape of `Self`. Called once per registry.
    fn shape() -> RecordShape<Self>;
}

type DefaultFn = dyn Fn() -> Decoded + Send + Sync;

#[derive(Clone)]
struct DefaultValue {
    produces: TypeRef,
    thunk: Arc<DefaultFn>,
}

/// A parameter of a record's primary constructor.
#[derive(Clone)]
pub struct Parameter {
    name: &'static str,
    ty: TypeRef,
    default: Option<DefaultValue>,
    rename: Option<&'static str>,
    qualifiers: Qualifiers,
}

impl Parameter {
    /// A parameter of type `V` named `name`.
    pub fn of<V: Any + Send>(name: &'static str) -> Self {
        Self::with_type(name, TypeRef::of::<V>())
    }

    /// A parameter of type `Option<V>` named `name`.
    pub fn nullable<V: Any + Send>(name: &'static str) -> Self {
        Self::with_type(name, TypeRef::nullable::<V>())
    }

    /// A parameter whose type is only known as a [`TypeRef`].
    pub fn with_type(name: &'static str, ty: TypeRef) -> Self {
        Self {
            name,
            ty,
            default: None,
            rename: None,
            qualifiers: Qualifiers::new(),
        }
    }

    /// Make the parameter optional, defaulting to the result of `default`.
    pub fn default_value<D: Any + Send>(
        mut self,
        default: impl Fn() -> D + Send + Sync + 'static,
    ) -> Self {
        self.default = Some(DefaultValue {
            produces: TypeRef::of::<D>(),
            thunk: Arc::new(move || Some(Box::new(default()) as Box<dyn Any + Send>)),
        });
        self
    }

    /// Make the parameter optional, defaulting to the result of `default`,
    /// which may be null.
    pub fn default_option<D: Any + Send>(
        mut self,
        default: impl Fn() -> Option<D> + Send + Sync + 'static,
    ) -> Self {
        self.default = Some(DefaultValue {
            produces: TypeRef::nullable::<D>(),
            thunk: Arc::new(move || default().map(|value| Box::new(value) as Box<dyn Any + Send>)),
        });
        self
    }

    /// Make the parameter optional, defaulting to null.
    pub fn default_null(mut self) -> Self {
        self.default = Some(DefaultValue {
            produces: self.ty.with_nullability(true),
            thunk: Arc::new(|| None),
        });
        self
    }

    /// Read this parameter from a field with another name. Takes precedence
    /// over a rename on the matching property.
    pub fn rename(mut self, wire_name: &'static str) -> Self {
        self.rename = Some(wire_name);
        self
    }

    /// Attach a qualifier, forwarded to converter lookup.
    pub fn qualifier(mut self, qualifier: &'static str) -> Self {
        self.qualifiers.insert(qualifier);
        self
    }

    /// The parameter's name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The parameter's declared type.
    pub const fn ty(&self) -> TypeRef {
        self.ty
    }

    /// Whether the parameter has a default.
    pub const fn is_optional(&self) -> bool {
        self.default.is_some()
    }

    /// The type the default produces, if there is one.
    pub fn default_type(&self) -> Option<TypeRef> {
        self.default.as_ref().map(|default| default.produces)
    }

    /// The wire name override.
    pub const fn renamed(&self) -> Option<&'static str> {
        self.rename
    }

    /// The qualifiers.
    pub const fn qualifiers(&self) -> &Qualifiers {
        &self.qualifiers
    }

    pub(crate) fn evaluate_default(&self) -> Option<Decoded> {
        self.default.as_ref().map(|default| (default.thunk)())
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("optional", &self.is_optional())
            .field("rename", &self.rename)
            .field("qualifiers", &self.qualifiers)
            .finish()
    }
}

type ConstructFn<T> = dyn Fn(&mut Arguments<'_>) -> Result<T, ArgumentError> + Send + Sync;

/// A record's primary constructor.
pub struct Constructor<T> {
    params: Vec<Parameter>,
    invoke: Box<ConstructFn<T>>,
}

impl<T> Constructor<T> {
    /// Start describing a constructor.
    pub fn builder() -> ConstructorBuilder<T> {
        ConstructorBuilder {
            params: Vec::new(),
            _record: PhantomData,
        }
    }

    /// The parameters, in declaration order.
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub(crate) fn call(&self, args: &mut Arguments<'_>) -> Result<T, ArgumentError> {
        (self.invoke)(args)
    }
}

impl<T> fmt::Debug for Constructor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Constructor`].
pub struct ConstructorBuilder<T> {
    params: Vec<Parameter>,
    _record: PhantomData<fn() -> T>,
}

impl<T> ConstructorBuilder<T> {
    /// Append a parameter.
    pub fn param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    /// Finish with the function that builds the record from its arguments.
    pub fn build(
        self,
        invoke: impl Fn(&mut Arguments<'_>) -> Result<T, ArgumentError> + Send + Sync + 'static,
    ) -> Constructor<T> {
        Constructor {
            params: self.params,
            invoke: Box::new(invoke),
        }
    }
}

pub(crate) trait Getter<T>: Send + Sync {
    /// The current value; `None` for null.
    fn get<'a>(&self, target: &'a T) -> Option<&'a dyn Any>;
}

pub(crate) trait Setter<T>: Send + Sync {
    fn set(&self, target: &mut T, value: Decoded) -> Result<(), ArgumentError>;
}

struct Direct<F, V> {
    get: F,
    _value: PhantomData<fn() -> V>,
}

impl<T, V, F> Getter<T> for Direct<F, V>
where
    V: Any,
    F: Fn(&T) -> &V + Send + Sync,
{
    fn get<'a>(&self, target: &'a T) -> Option<&'a dyn Any> {
        Some((self.get)(target))
    }
}

struct Optional<F, V> {
    get: F,
    _value: PhantomData<fn() -> V>,
}

impl<T, V, F> Getter<T> for Optional<F, V>
where
    V: Any,
    F: Fn(&T) -> Option<&V> + Send + Sync,
{
    fn get<'a>(&self, target: &'a T) -> Option<&'a dyn Any> {
        (self.get)(target).map(|value| value as &dyn Any)
    }
}

struct SetDirect<F, V> {
    property: &'static str,
    set: F,
    _value: PhantomData<fn(V)>,
}

impl<T, V, F> Setter<T> for SetDirect<F, V>
where
    V: Any,
    F: Fn(&mut T, V) + Send + Sync,
{
    fn set(&self, target: &mut T, value: Decoded) -> Result<(), ArgumentError> {
        let value = value.ok_or(ArgumentError::UnexpectedNull {
            parameter: self.property,
        })?;
        let value = value
            .downcast::<V>()
            .map_err(|_| ArgumentError::WrongType {
                parameter: self.property,
                expected: core::any::type_name::<V>(),
            })?;
        (self.set)(target, *value);
        Ok(())
    }
}

struct SetOptional<F, V> {
    property: &'static str,
    set: F,
    _value: PhantomData<fn(V)>,
}

impl<T, V, F> Setter<T> for SetOptional<F, V>
where
    V: Any,
    F: Fn(&mut T, Option<V>) + Send + Sync,
{
    fn set(&self, target: &mut T, value: Decoded) -> Result<(), ArgumentError> {
        let value = value
            .map(|value| value.downcast::<V>().map(|value| *value))
            .transpose()
            .map_err(|_| ArgumentError::WrongType {
                parameter: self.property,
                expected: core::any::type_name::<V>(),
            })?;
        (self.set)(target, value);
        Ok(())
    }
}

/// An externally visible property of a record.
pub struct Property<T> {
    name: &'static str,
    ty: TypeRef,
    getter: Box<dyn Getter<T>>,
    setter: Option<Box<dyn Setter<T>>>,
    transient: bool,
    rename: Option<&'static str>,
    qualifiers: Qualifiers,
}

impl<T: 'static> Property<T> {
    /// A non-null property read through `get`.
    pub fn new<V, F>(name: &'static str, get: F) -> PropertyDef<T, V>
    where
        V: Any + Send,
        F: Fn(&T) -> &V + Send + Sync + 'static,
    {
        PropertyDef {
            property: Property::erased(
                name,
                TypeRef::of::<V>(),
                Box::new(Direct {
                    get,
                    _value: PhantomData,
                }),
            ),
            _value: PhantomData,
        }
    }

    /// A nullable property read through `get`.
    pub fn nullable<V, F>(name: &'static str, get: F) -> NullablePropertyDef<T, V>
    where
        V: Any + Send,
        F: Fn(&T) -> Option<&V> + Send + Sync + 'static,
    {
        NullablePropertyDef {
            property: Property::erased(
                name,
                TypeRef::nullable::<V>(),
                Box::new(Optional {
                    get,
                    _value: PhantomData,
                }),
            ),
            _value: PhantomData,
        }
    }

    fn erased(name: &'static str, ty: TypeRef, getter: Box<dyn Getter<T>>) -> Self {
        Self {
            name,
            ty,
            getter,
            setter: None,
            transient: false,
            rename: None,
            qualifiers: Qualifiers::new(),
        }
    }
}

impl<T> Property<T> {
    /// The property's name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The property's declared type.
    pub const fn ty(&self) -> TypeRef {
        self.ty
    }

    /// Whether the property can be written after construction.
    pub const fn is_settable(&self) -> bool {
        self.setter.is_some()
    }

    /// Whether the property is excluded from the wire format.
    pub const fn is_transient(&self) -> bool {
        self.transient
    }

    /// The wire name override.
    pub const fn renamed(&self) -> Option<&'static str> {
        self.rename
    }

    /// The qualifiers.
    pub const fn qualifiers(&self) -> &Qualifiers {
        &self.qualifiers
    }

    pub(crate) fn into_accessor(self) -> Accessor<T> {
        Accessor {
            getter: self.getter,
            setter: self.setter,
        }
    }
}

impl<T> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("settable", &self.is_settable())
            .field("transient", &self.transient)
            .field("rename", &self.rename)
            .field("qualifiers", &self.qualifiers)
            .finish()
    }
}

/// Read access to a property and, when settable, write access.
pub(crate) struct Accessor<T> {
    getter: Box<dyn Getter<T>>,
    setter: Option<Box<dyn Setter<T>>>,
}

impl<T> Accessor<T> {
    pub(crate) fn get<'a>(&self, target: &'a T) -> Option<&'a dyn Any> {
        self.getter.get(target)
    }

    pub(crate) fn is_settable(&self) -> bool {
        self.setter.is_some()
    }

    /// Write through the setter. A read-only accessor ignores the value.
    pub(crate) fn set(&self, target: &mut T, value: Decoded) -> Result<(), ArgumentError> {
        match &self.setter {
            Some(setter) => setter.set(target, value),
            None => Ok(()),
        }
    }
}

macro_rules! property_def_options {
    () => {
        /// Write this property to a field with another name.
        pub fn rename(mut self, wire_name: &'static str) -> Self {
            self.property.rename = Some(wire_name);
            self
        }

        /// Attach a qualifier, forwarded to converter lookup.
        pub fn qualifier(mut self, qualifier: &'static str) -> Self {
            self.property.qualifiers.insert(qualifier);
            self
        }

        /// Exclude the property from the wire format.
        pub fn transient(mut self) -> Self {
            self.property.transient = true;
            self
        }
    };
}

/// A non-null property under construction. Converts into [`Property`].
pub struct PropertyDef<T, V> {
    property: Property<T>,
    _value: PhantomData<fn() -> V>,
}

impl<T: 'static, V: Any + Send> PropertyDef<T, V> {
    property_def_options!();

    /// Make the property writable after construction.
    pub fn setter(mut self, set: impl Fn(&mut T, V) + Send + Sync + 'static) -> Self {
        self.property.setter = Some(Box::new(SetDirect {
            property: self.property.name,
            set,
            _value: PhantomData,
        }));
        self
    }
}

impl<T, V> From<PropertyDef<T, V>> for Property<T> {
    fn from(def: PropertyDef<T, V>) -> Self {
        def.property
    }
}

/// A nullable property under construction. Converts into [`Property`].
pub struct NullablePropertyDef<T, V> {
    property: Property<T>,
    _value: PhantomData<fn() -> V>,
}

impl<T: 'static, V: Any + Send> NullablePropertyDef<T, V> {
    property_def_options!();

    /// Make the property writable after construction.
    pub fn setter(mut self, set: impl Fn(&mut T, Option<V>) + Send + Sync + 'static) -> Self {
        self.property.setter = Some(Box::new(SetOptional {
            property: self.property.name,
            set,
            _value: PhantomData,
        }));
        self
    }
}

impl<T, V> From<NullablePropertyDef<T, V>> for Property<T> {
    fn from(def: NullablePropertyDef<T, V>) -> Self {
        def.property
    }
}

/// Everything the binder knows about a record type.
pub struct RecordShape<T> {
    name: &'static str,
    kind: TypeKind,
    constructor: Option<Constructor<T>>,
    properties: Vec<Property<T>>,
}

impl<T> RecordShape<T> {
    /// Start describing the record named `name`.
    pub fn builder(name: &'static str) -> RecordShapeBuilder<T> {
        RecordShapeBuilder {
            shape: RecordShape {
                name,
                kind: TypeKind::Class,
                constructor: None,
                properties: Vec::new(),
            },
        }
    }

    /// The record's name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The record's kind.
    pub const fn kind(&self) -> TypeKind {
        self.kind
    }

    /// The primary constructor, if the type has one.
    pub const fn constructor(&self) -> Option<&Constructor<T>> {
        self.constructor.as_ref()
    }

    /// The properties, in declaration order.
    pub fn properties(&self) -> &[Property<T>] {
        &self.properties
    }

    pub(crate) fn into_parts(self) -> (Option<Constructor<T>>, Vec<Property<T>>) {
        (self.constructor, self.properties)
    }
}

impl<T> fmt::Debug for RecordShape<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordShape")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("constructor", &self.constructor)
            .field("properties", &self.properties)
            .finish()
    }
}

/// Builder for [`RecordShape`].
pub struct RecordShapeBuilder<T> {
    shape: RecordShape<T>,
}

impl<T> RecordShapeBuilder<T> {
    /// Set the kind; defaults to [`TypeKind::Class`].
    pub fn kind(mut self, kind: TypeKind) -> Self {
        self.shape.kind = kind;
        self
    }

    /// Set the primary constructor.
    pub fn constructor(mut self, constructor: Constructor<T>) -> Self {
        self.shape.constructor = Some(constructor);
        self
    }

    /// Append a property.
    pub fn property(mut self, property: impl Into<Property<T>>) -> Self {
        self.shape.properties.push(property.into());
        self
    }

    /// Finish the shape.
    pub fn build(self) -> RecordShape<T> {
        self.shape
    }
}
