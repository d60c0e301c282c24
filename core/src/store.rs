//! Typed object repository for one submission
//!
//! The store maps (domain type, string key) to exactly one object. It is
//! created per submission, filled by the mapping engine, read by validation
//! and export, and dropped afterwards. It is not meant to be shared across
//! threads.

use indexmap::IndexMap;
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use tracing::debug;

/// In-memory view of one submission's domain graph
#[derive(Default)]
pub struct Store {
    objects: HashMap<TypeId, IndexMap<String, Box<dyn Any>>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("size", &self.size()).finish()
    }
}

impl Store {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an object. A `None` key discards the object.
    ///
    /// Returns the object previously stored under the same key, if any.
    pub fn put<T: Any>(&mut self, key: Option<String>, object: T) -> Option<T> {
        let Some(key) = key else {
            debug!(kind = type_name::<T>(), "Discarding object without key");
            return None;
        };

        debug!(kind = type_name::<T>(), %key, "Storing object");
        self.objects
            .entry(TypeId::of::<T>())
            .or_default()
            .insert(key, Box::new(object))
            .and_then(|previous| previous.downcast::<T>().ok())
            .map(|previous| *previous)
    }

    /// Point lookup
    #[must_use]
    pub fn get_type<T: Any>(&self, key: &str) -> Option<&T> {
        self.objects
            .get(&TypeId::of::<T>())
            .and_then(|objects| objects.get(key))
            .and_then(|object| object.downcast_ref::<T>())
    }

    /// Mutable point lookup
    pub fn get_type_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.objects
            .get_mut(&TypeId::of::<T>())
            .and_then(|objects| objects.get_mut(key))
            .and_then(|object| object.downcast_mut::<T>())
    }

    /// Every object of a type, in first-insertion order
    #[must_use]
    pub fn values_of_type<T: Any>(&self) -> Vec<&T> {
        self.objects
            .get(&TypeId::of::<T>())
            .map(|objects| {
                objects
                    .values()
                    .filter_map(|object| object.downcast_ref::<T>())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Keys of every object of a type
    #[must_use]
    pub fn keys_of_type<T: Any>(&self) -> Vec<&str> {
        self.objects
            .get(&TypeId::of::<T>())
            .map(|objects| objects.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Remove and return an object
    pub fn remove<T: Any>(&mut self, key: &str) -> Option<T> {
        self.objects
            .get_mut(&TypeId::of::<T>())
            .and_then(|objects| objects.shift_remove(key))
            .and_then(|object| object.downcast::<T>().ok())
            .map(|object| *object)
    }

    /// Number of objects of a type
    #[must_use]
    pub fn count_of_type<T: Any>(&self) -> usize {
        self.objects
            .get(&TypeId::of::<T>())
            .map_or(0, IndexMap::len)
    }

    /// Total number of objects
    #[must_use]
    pub fn size(&self) -> usize {
        self.objects.values().map(IndexMap::len).sum()
    }

    /// Whether the store holds no object
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }
}
