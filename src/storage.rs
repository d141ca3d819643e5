//! Type-keyed storage.
//!
//! Used by [`Application`](crate::server::Application) to memoize the Lambda
//! server and by [`HttpRequest`](crate::http::HttpRequest) to carry the raw
//! invocation event alongside the generic request.

use std::any::{Any, TypeId};
use std::collections::HashMap;

/// A key into [`Storage`]. The key type itself is the tag; `Value` is what
/// gets stored under it.
pub trait StorageKey: 'static {
    type Value: Send + Sync + 'static;
}

/// Map from key type to a value of that key's `Value` type.
#[derive(Default)]
pub struct Storage {
    values: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<K: StorageKey>(&self) -> Option<&K::Value> {
        self.values
            .get(&TypeId::of::<K>())
            .and_then(|value| value.downcast_ref::<K::Value>())
    }

    /// Store `value` under `K`, returning the previous value if any.
    pub fn insert<K: StorageKey>(&mut self, value: K::Value) -> Option<K::Value> {
        self.values
            .insert(TypeId::of::<K>(), Box::new(value))
            .and_then(|previous| previous.downcast::<K::Value>().ok())
            .map(|previous| *previous)
    }

    pub fn contains<K: StorageKey>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<K>())
    }

    /// Return the value under `K`, creating it with `create` on first use.
    pub fn get_or_insert_with<K, F>(&mut self, create: F) -> &mut K::Value
    where
        K: StorageKey,
        F: FnOnce() -> K::Value,
    {
        let slot = self
            .values
            .entry(TypeId::of::<K>())
            .or_insert_with(|| Box::new(create()));
        match slot.downcast_mut::<K::Value>() {
            Some(value) => value,
            // TypeId -> value type is fixed by StorageKey, so the entry always matches.
            None => unreachable!("storage entry has mismatched type"),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("entries", &self.len())
            .finish()
    }
}
