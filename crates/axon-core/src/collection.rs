//! Ordered, uniquely-keyed container.
//!
//! [`KeyedContainer`] is the substrate every registry in Axon is built on.
//! It maps a string label to a value, refuses duplicate labels, and
//! enumerates entries in insertion order.
//!
//! The element type doubles as the "base kind" constraint: a
//! `KeyedContainer<Arc<Listener>>` can only ever hold listeners.
//!
//! ```rust,ignore
//! use axon_core::KeyedContainer;
//!
//! let mut modules = KeyedContainer::new();
//! modules.add("core", 1)?;
//! modules.add("fun", 2)?;
//! assert!(modules.add("core", 3).is_err());
//! assert_eq!(modules.keys().collect::<Vec<_>>(), ["core", "fun"]);
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::error::{ContainerError, ContainerResult};

/// An insertion-ordered map from label to value with unique keys.
#[derive(Clone)]
pub struct KeyedContainer<T> {
    /// Labels in insertion order.
    order: Vec<String>,
    entries: HashMap<String, T>,
}

impl<T> KeyedContainer<T> {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            entries: HashMap::new(),
        }
    }

    /// Adds `value` under `label`.
    ///
    /// Fails with [`ContainerError::DuplicateKey`] when the label is already
    /// present; the existing entry is left untouched.
    pub fn add(&mut self, label: impl Into<String>, value: T) -> ContainerResult<()> {
        let label = label.into();
        if self.entries.contains_key(&label) {
            return Err(ContainerError::DuplicateKey { key: label });
        }
        self.order.push(label.clone());
        self.entries.insert(label, value);
        Ok(())
    }

    /// Returns the value stored under `label`, if any.
    pub fn get(&self, label: &str) -> Option<&T> {
        self.entries.get(label)
    }

    /// Returns a mutable reference to the value stored under `label`.
    pub fn get_mut(&mut self, label: &str) -> Option<&mut T> {
        self.entries.get_mut(label)
    }

    /// Returns `true` if `label` is present.
    pub fn has(&self, label: &str) -> bool {
        self.entries.contains_key(label)
    }

    /// Replaces the value of an existing entry, keeping its position.
    ///
    /// Returns the previous value, or `None` (without inserting) when the
    /// label is absent.
    pub fn update(&mut self, label: &str, value: T) -> Option<T> {
        self.entries
            .get_mut(label)
            .map(|slot| std::mem::replace(slot, value))
    }

    /// Removes and returns the value stored under `label`.
    pub fn remove(&mut self, label: &str) -> Option<T> {
        let value = self.entries.remove(label)?;
        self.order.retain(|k| k != label);
        Some(value)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` when the container holds no entries.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates `(label, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.order
            .iter()
            .filter_map(|k| self.entries.get(k).map(|v| (k.as_str(), v)))
    }

    /// Iterates labels in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Iterates values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|k| self.entries.get(k))
    }

    /// Returns the first value (in insertion order) matching `predicate`.
    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<&T> {
        self.values().find(|v| predicate(v))
    }

    /// Returns every value (in insertion order) matching `predicate`.
    pub fn filter(&self, mut predicate: impl FnMut(&T) -> bool) -> Vec<&T> {
        self.values().filter(|v| predicate(v)).collect()
    }

    /// Consumes the container, yielding `(label, value)` pairs in order.
    pub fn into_entries(mut self) -> Vec<(String, T)> {
        let order = std::mem::take(&mut self.order);
        order
            .into_iter()
            .filter_map(|k| self.entries.remove(&k).map(|v| (k, v)))
            .collect()
    }
}

impl<T> Default for KeyedContainer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for KeyedContainer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
