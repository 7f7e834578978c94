//! Typed, copy-on-write request extensions.
//!
//! Values are stored under named [`Key`]s. Writing returns a new bag and
//! leaves the original untouched; the storage is shared until the first
//! write, so cloning a bag is cheap.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A typed key into [`Extensions`].
///
/// ```
/// use heron_core::{Extensions, Key};
///
/// const USER: Key<String> = Key::new("app.user");
///
/// let empty = Extensions::new();
/// let ext = empty.with(&USER, "ada".to_string());
/// assert_eq!(ext.get(&USER).map(String::as_str), Some("ada"));
/// assert!(empty.get(&USER).is_none());
/// ```
pub struct Key<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    /// Creates a key. Names should be unique across the application.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// The key name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Key").field(&self.name).finish()
    }
}

/// An immutable bag of typed values.
#[derive(Clone, Default)]
pub struct Extensions {
    values: Arc<HashMap<&'static str, Arc<dyn Any + Send + Sync>>>,
}

impl Extensions {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`, if present with type `T`.
    #[must_use]
    pub fn get<T>(&self, key: &Key<T>) -> Option<&T>
    where
        T: Send + Sync + 'static,
    {
        self.values.get(key.name)?.downcast_ref::<T>()
    }

    /// Returns true if anything is stored under `key`.
    #[must_use]
    pub fn contains<T>(&self, key: &Key<T>) -> bool {
        self.values.contains_key(key.name)
    }

    /// Returns a new bag with `value` stored under `key`.
    #[must_use]
    pub fn with<T>(&self, key: &Key<T>, value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        let mut values = HashMap::clone(&self.values);
        values.insert(key.name, Arc::new(value));
        Self {
            values: Arc::new(values),
        }
    }

    /// Returns a new bag without `key`.
    #[must_use]
    pub fn without<T>(&self, key: &Key<T>) -> Self {
        if !self.contains(key) {
            return self.clone();
        }
        let mut values = HashMap::clone(&self.values);
        values.remove(key.name);
        Self {
            values: Arc::new(values),
        }
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}
