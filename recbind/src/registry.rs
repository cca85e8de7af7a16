//! Converter lookup: an ordered chain of factories with a memoizing cache.
//!
//! Lookups are keyed by `(TypeId, Qualifiers)`; nullability is not part of the
//! key because every converter is null-safe. A lookup that re-enters itself on
//! the same thread (a record that contains itself, directly or not) gets a
//! deferred converter that forwards to the real one once it is built.

use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::OnceLock;

use parking_lot::RwLock;
use recbind_core::{FieldReader, FieldWriter};

use crate::adapter::Adapter;
use crate::converter::{Converter, ConverterFactory, Decoded};
use crate::error::{ConfigError, DecodeError, EncodeError};
use crate::list::ListFactory;
use crate::record::RecordFactory;
use crate::shape::Record;
use crate::standard::StandardFactory;
use crate::types::{Qualifiers, TypeRef};

type CacheKey = (TypeId, Qualifiers);

/// Hand-written or generated converters, preferred over shape inspection.
#[derive(Default, Clone)]
pub struct GeneratedConverters {
    converters: HashMap<TypeId, Arc<dyn Converter>>,
}

impl GeneratedConverters {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `converter` for `T`, replacing any earlier one.
    pub fn insert<T: Any>(&mut self, converter: Arc<dyn Converter>) {
        self.converters.insert(TypeId::of::<T>(), converter);
    }

    /// The converter registered for `id`.
    pub fn get(&self, id: TypeId) -> Option<Arc<dyn Converter>> {
        self.converters.get(&id).cloned()
    }

    /// Number of registered converters.
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

struct Inner {
    factories: Vec<Arc<dyn ConverterFactory>>,
    generated: GeneratedConverters,
    cache: RwLock<HashMap<CacheKey, Arc<dyn Converter>>>,
}

/// An ordered list of converter factories. The first factory that produces a
/// converter wins; results are cached.
///
/// Cloning is cheap and clones share the cache.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

/// A lookup in progress on this thread.
struct Pending {
    registry: usize,
    key: CacheKey,
    deferred: Arc<Deferred>,
}

thread_local! {
    static PENDING: RefCell<Vec<Pending>> = const { RefCell::new(Vec::new()) };
}

impl Registry {
    /// Start configuring a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    /// The generated-converter table consulted by record factories.
    pub fn generated(&self) -> &GeneratedConverters {
        &self.inner.generated
    }

    /// Find the converter for `ty` with `qualifiers`. `debug_name` names the
    /// requester in logs.
    pub fn lookup(
        &self,
        ty: &TypeRef,
        qualifiers: &Qualifiers,
        debug_name: &str,
    ) -> Result<Arc<dyn Converter>, ConfigError> {
        let ty = ty.with_nullability(false);
        let key: CacheKey = (ty.id(), qualifiers.clone());

        if let Some(converter) = self.inner.cache.read().get(&key) {
            trace!(ty = %ty, debug_name, "converter cache hit");
            return Ok(Arc::clone(converter));
        }

        let registry = self.id();
        let pending = PENDING.with(|pending| {
            pending
                .borrow()
                .iter()
                .find(|entry| entry.registry == registry && entry.key == key)
                .map(|entry| Arc::clone(&entry.deferred))
        });
        if let Some(deferred) = pending {
            trace!(ty = %ty, debug_name, "handing out deferred converter");
            return Ok(deferred as Arc<dyn Converter>);
        }

        let deferred = Arc::new(Deferred::new(ty.name()));
        PENDING.with(|pending| {
            pending.borrow_mut().push(Pending {
                registry,
                key: key.clone(),
                deferred: Arc::clone(&deferred),
            });
        });
        let created = self.create(&ty, qualifiers);
        PENDING.with(|pending| {
            let mut pending = pending.borrow_mut();
            if let Some(position) = pending
                .iter()
                .rposition(|entry| entry.registry == registry && entry.key == key)
            {
                pending.remove(position);
            }
        });

        let converter = created?.ok_or_else(|| ConfigError::NoConverter {
            ty,
            qualifiers: qualifiers.clone(),
        })?;
        deferred.resolve(&converter);
        debug!(ty = %ty, debug_name, "created converter");

        let mut cache = self.inner.cache.write();
        Ok(Arc::clone(cache.entry(key).or_insert(converter)))
    }

    fn create(
        &self,
        ty: &TypeRef,
        qualifiers: &Qualifiers,
    ) -> Result<Option<Arc<dyn Converter>>, ConfigError> {
        for factory in &self.inner.factories {
            if let Some(converter) = factory.create(ty, qualifiers, self)? {
                return Ok(Some(converter));
            }
        }
        Ok(None)
    }

    /// A typed adapter for `T`, without qualifiers.
    pub fn adapter<T: Any + Send>(&self) -> Result<Adapter<T>, ConfigError> {
        let converter = self.lookup(
            &TypeRef::of::<T>(),
            &Qualifiers::new(),
            core::any::type_name::<T>(),
        )?;
        Ok(Adapter::new(converter))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::builder().build()
    }
}

impl core::fmt::Debug for Registry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registry")
            .field("factories", &self.inner.factories.len())
            .field("generated", &self.inner.generated.len())
            .field("cached", &self.inner.cache.read().len())
            .finish()
    }
}

/// Stands in for a converter that is still being built.
///
/// Holds a weak reference once resolved; the registry cache owns the target.
struct Deferred {
    type_name: &'static str,
    target: OnceLock<Weak<dyn Converter>>,
}

impl Deferred {
    fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            target: OnceLock::new(),
        }
    }

    fn resolve(&self, converter: &Arc<dyn Converter>) {
        let _ = self.target.set(Arc::downgrade(converter));
    }

    fn target(&self) -> Option<Arc<dyn Converter>> {
        self.target.get().and_then(Weak::upgrade)
    }
}

impl Converter for Deferred {
    fn decode(&self, reader: &mut dyn FieldReader) -> Result<Decoded, DecodeError> {
        let target = self.target().ok_or(DecodeError::Unresolved {
            type_name: self.type_name,
        })?;
        target.decode(reader)
    }

    fn encode(
        &self,
        writer: &mut dyn FieldWriter,
        value: Option<&dyn Any>,
    ) -> Result<(), EncodeError> {
        let target = self.target().ok_or(EncodeError::Unresolved {
            type_name: self.type_name,
        })?;
        target.encode(writer, value)
    }
}

/// Configures a [`Registry`].
///
/// Factories are consulted in this order: those added with
/// [`RegistryBuilder::add`], the scalar converters, list converters, then
/// record converters.
#[derive(Default)]
pub struct RegistryBuilder {
    user: Vec<Arc<dyn ConverterFactory>>,
    lists: Vec<Arc<dyn ConverterFactory>>,
    records: Vec<Arc<dyn ConverterFactory>>,
    generated: GeneratedConverters,
}

impl RegistryBuilder {
    /// Add a factory, ahead of every built-in one.
    pub fn add(mut self, factory: impl ConverterFactory + 'static) -> Self {
        self.user.push(Arc::new(factory));
        self
    }

    /// Bind `T` through its [`Record`] shape.
    pub fn record<T: Record>(mut self) -> Self {
        self.records.push(Arc::new(RecordFactory::<T>::new()));
        self
    }

    /// Serve `Vec<V>` as an array of `V`.
    pub fn list<V: Any + Send>(mut self) -> Self {
        self.lists.push(Arc::new(ListFactory::<V>::new()));
        self
    }

    /// Use `converter` for `T` wherever a record converter would be built.
    pub fn generated<T: Any>(mut self, converter: impl Converter + 'static) -> Self {
        self.generated.insert::<T>(Arc::new(converter));
        self
    }

    /// Finish the registry.
    pub fn build(self) -> Registry {
        let mut factories = self.user;
        factories.push(Arc::new(StandardFactory));
        factories.extend(self.lists);
        factories.extend(self.records);
        Registry {
            inner: Arc::new(Inner {
                factories,
                generated: self.generated,
                cache: RwLock::new(HashMap::new()),
            }),
        }
    }
}
