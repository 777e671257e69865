//! Generic keyed record collection backing every repository.
//!
//! Each record lives behind its own `dashmap` entry lock, so a single
//! [`Collection::update_one`] call is atomic with respect to concurrent
//! readers and writers of the same record. Nothing spans records.

use std::hash::Hash;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;

/// A named, keyed set of records.
#[derive(Debug)]
pub struct Collection<K, V>
where
    K: Eq + Hash,
{
    name: &'static str,
    records: DashMap<K, V>,
}

impl<K, V> Collection<K, V>
where
    K: Eq + Hash + Copy + std::fmt::Display,
    V: Clone,
{
    /// Create an empty collection.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            records: DashMap::new(),
        }
    }

    /// Collection name used in messages.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the collection holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Fetch a record by key.
    pub fn get(&self, key: &K) -> Option<V> {
        self.records.get(key).map(|r| r.value().clone())
    }

    /// First record matching `filter`.
    pub fn find_one(&self, filter: impl Fn(&V) -> bool) -> Option<V> {
        self.records
            .iter()
            .find(|r| filter(r.value()))
            .map(|r| r.value().clone())
    }

    /// Every record matching `filter`, unordered.
    pub fn find(&self, filter: impl Fn(&V) -> bool) -> Vec<V> {
        self.records
            .iter()
            .filter(|r| filter(r.value()))
            .map(|r| r.value().clone())
            .collect()
    }

    /// Keys of every record matching `filter`.
    pub fn keys_where(&self, filter: impl Fn(&V) -> bool) -> Vec<K> {
        self.records
            .iter()
            .filter(|r| filter(r.value()))
            .map(|r| *r.key())
            .collect()
    }

    /// Insert a new record; an existing key is a conflict.
    pub fn insert_one(&self, key: K, value: V) -> AppResult<()> {
        match self.records.entry(key) {
            Entry::Occupied(_) => Err(AppError::conflict(format!(
                "Duplicate key {key} in {}",
                self.name
            ))),
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
        }
    }

    /// Apply `update` to the record at `key` when it still satisfies
    /// `filter`, holding the record's lock for the whole call.
    ///
    /// The update runs against a copy that replaces the stored record only
    /// on success, so a failed update leaves the record untouched. Returns
    /// `None` when the key is absent or the filter no longer matches.
    pub fn update_one<R>(
        &self,
        key: &K,
        filter: impl Fn(&V) -> bool,
        update: impl FnOnce(&mut V) -> AppResult<R>,
    ) -> AppResult<Option<(V, R)>> {
        let Some(mut guard) = self.records.get_mut(key) else {
            return Ok(None);
        };
        if !filter(guard.value()) {
            return Ok(None);
        }
        let mut working = guard.value().clone();
        let out = update(&mut working)?;
        *guard.value_mut() = working.clone();
        Ok(Some((working, out)))
    }

    /// Remove the record at `key` when it satisfies `filter`.
    pub fn remove_if(&self, key: &K, filter: impl Fn(&V) -> bool) -> Option<V> {
        self.records
            .remove_if(key, |_, v| filter(v))
            .map(|(_, v)| v)
    }

    /// Remove every record matching `filter`, returning the removed records.
    pub fn delete_many(&self, filter: impl Fn(&V) -> bool) -> Vec<V> {
        self.keys_where(&filter)
            .into_iter()
            .filter_map(|key| self.remove_if(&key, &filter))
            .collect()
    }

    /// Copy of every record.
    pub fn snapshot(&self) -> Vec<V> {
        self.records.iter().map(|r| r.value().clone()).collect()
    }

    /// Replace the contents with `records`, keyed by `key_of`.
    pub fn load(&self, records: impl IntoIterator<Item = V>, key_of: impl Fn(&V) -> K) {
        self.records.clear();
        for record in records {
            self.records.insert(key_of(&record), record);
        }
    }
}
