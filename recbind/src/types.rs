//! Type identities used to match properties, parameters and converters.

use alloc::collections::BTreeSet;
use core::any::{Any, TypeId};
use core::fmt;

/// A declared type: a concrete Rust type plus whether null is allowed.
///
/// A field of type `Option<V>` is described as `TypeRef::nullable::<V>()`, so
/// the same converter serves both.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeRef {
    id: TypeId,
    name: &'static str,
    nullable: bool,
}

impl TypeRef {
    /// The non-nullable type `V`.
    pub fn of<V: Any>() -> Self {
        Self {
            id: TypeId::of::<V>(),
            name: core::any::type_name::<V>(),
            nullable: false,
        }
    }

    /// The nullable type `V?`.
    pub fn nullable<V: Any>() -> Self {
        Self::of::<V>().with_nullability(true)
    }

    /// The [`TypeId`] of the underlying type.
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// The Rust name of the underlying type.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Whether null is an acceptable value.
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Same type, with the given nullability.
    pub const fn with_nullability(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Whether `V` is the underlying type.
    pub fn is<V: Any>(&self) -> bool {
        self.id == TypeId::of::<V>()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)?;
        if self.nullable {
            f.write_str("?")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({self})")
    }
}

/// Qualifier names attached to a property or parameter.
///
/// Converter lookups are keyed on type *and* qualifiers, so a qualified
/// `String` can be served by a different converter than a plain one.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Qualifiers(BTreeSet<&'static str>);

impl Qualifiers {
    /// No qualifiers.
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Add a qualifier.
    pub fn insert(&mut self, qualifier: &'static str) {
        self.0.insert(qualifier);
    }

    /// Whether the set carries `qualifier`.
    pub fn contains(&self, qualifier: &str) -> bool {
        self.0.contains(qualifier)
    }

    /// Both sets merged.
    pub fn union(&self, other: &Qualifiers) -> Qualifiers {
        Qualifiers(self.0.union(&other.0).copied().collect())
    }

    /// Whether there are no qualifiers.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().copied()
    }
}

impl<const N: usize> From<[&'static str; N]> for Qualifiers {
    fn from(names: [&'static str; N]) -> Self {
        Qualifiers(names.into_iter().collect())
    }
}

impl fmt::Debug for Qualifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for Qualifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, qualifier) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "@{qualifier}")?;
        }
        Ok(())
    }
}

/// What sort of type a record shape describes.
///
/// Only [`TypeKind::Class`] can be bound to a constructor; every other kind
/// is refused by the inspector with a reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypeKind {
    /// A concrete record type.
    #[default]
    Class,
    /// An interface or trait object.
    Interface,
    /// An enumeration.
    Enum,
    /// An abstract type with no instances of its own.
    Abstract,
    /// A type declared inside a function body.
    Local,
    /// A type whose instances are bound to an enclosing instance.
    Inner,
    /// A type with exactly one instance.
    Singleton,
    /// The root of a closed hierarchy.
    SealedRoot,
}

impl TypeKind {
    pub(crate) const fn describe(self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
            TypeKind::Abstract => "abstract type",
            TypeKind::Local => "local type",
            TypeKind::Inner => "inner type",
            TypeKind::Singleton => "singleton",
            TypeKind::SealedRoot => "sealed type",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullability_is_part_of_identity() {
        assert_ne!(TypeRef::of::<i64>(), TypeRef::nullable::<i64>());
        assert_eq!(
            TypeRef::of::<i64>().with_nullability(true),
            TypeRef::nullable::<i64>()
        );
        assert!(TypeRef::nullable::<String>().is::<String>());
    }

    #[test]
    fn display_marks_nullable_types() {
        assert_eq!(TypeRef::nullable::<u8>().to_string(), "u8?");
        assert_eq!(TypeRef::of::<bool>().to_string(), "bool");
    }

    #[test]
    fn qualifiers_union_is_sorted() {
        let a = Qualifiers::from(["hex", "trim"]);
        let b = Qualifiers::from(["lower", "hex"]);
        assert_eq!(a.union(&b).to_string(), "@hex @lower @trim");
        assert!(Qualifiers::new().is_empty());
    }
}
