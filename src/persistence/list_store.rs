//! Append-only lists mirrored to key-value storage
//!
//! Used identically for the cart and the wishlist; only the storage key differs.

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::clothing::ClothingItem;
use crate::consts::{CART_KEY, WISHLIST_KEY};
use crate::platform::{KeyValueStore, StorageError};

/// Errors from writing a list
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("Failed to serialize list: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Return a new list with `item` appended, leaving `list` untouched
pub fn append<T: Clone>(list: &[T], item: T) -> Vec<T> {
    let mut next = Vec::with_capacity(list.len() + 1);
    next.extend_from_slice(list);
    next.push(item);
    next
}

/// A JSON array stored under a fixed key
#[derive(Debug, Clone)]
pub struct ListStore<T, S> {
    key: &'static str,
    storage: S,
    _entry: PhantomData<T>,
}

impl<S: KeyValueStore> ListStore<ClothingItem, S> {
    /// Store for the shopping cart
    pub fn cart(storage: S) -> Self {
        Self::new(CART_KEY, storage)
    }

    /// Store for the wishlist
    pub fn wishlist(storage: S) -> Self {
        Self::new(WISHLIST_KEY, storage)
    }
}

impl<T, S> ListStore<T, S>
where
    T: Serialize + DeserializeOwned,
    S: KeyValueStore,
{
    pub fn new(key: &'static str, storage: S) -> Self {
        Self {
            key,
            storage,
            _entry: PhantomData,
        }
    }

    /// Load the stored list.
    ///
    /// Never fails: a missing key, unreadable storage, or a value that is not
    /// a JSON array all load as an empty list. Entries that don't parse are
    /// skipped.
    pub fn load(&self) -> Vec<T> {
        let json = match self.storage.get_item(self.key) {
            Ok(Some(json)) => json,
            Ok(None) => {
                log::info!("No saved '{}' list, starting empty", self.key);
                return Vec::new();
            }
            Err(e) => {
                log::warn!("Could not read '{}': {}", self.key, e);
                return Vec::new();
            }
        };

        let values: Vec<serde_json::Value> = match serde_json::from_str(&json) {
            Ok(values) => values,
            Err(e) => {
                log::warn!("Discarding corrupt '{}' list: {}", self.key, e);
                return Vec::new();
            }
        };

        let total = values.len();
        let items: Vec<T> = values
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect();
        if items.len() < total {
            log::warn!(
                "Skipped {} unreadable entries in '{}'",
                total - items.len(),
                self.key
            );
        }

        log::info!("Loaded {} entries from '{}'", items.len(), self.key);
        items
    }

    /// Overwrite the stored list, reporting failures
    pub fn try_persist(&self, list: &[T]) -> Result<(), PersistError> {
        let json = serde_json::to_string(list)?;
        self.storage.set_item(self.key, &json)?;
        Ok(())
    }

    /// Overwrite the stored list. Failures are logged and otherwise dropped.
    pub fn persist(&self, list: &[T]) {
        match self.try_persist(list) {
            Ok(()) => log::info!("'{}' saved ({} entries)", self.key, list.len()),
            Err(e) => log::warn!("Failed to save '{}': {}", self.key, e),
        }
    }
}

/// In-memory mirror of a stored list.
///
/// Every change replaces the mirror with a new list and rewrites storage.
#[derive(Debug, Clone)]
pub struct PersistentList<T, S> {
    store: ListStore<T, S>,
    items: Vec<T>,
}

impl<T, S> PersistentList<T, S>
where
    T: Clone + Serialize + DeserializeOwned,
    S: KeyValueStore,
{
    /// Seed the mirror from storage
    pub fn open(store: ListStore<T, S>) -> Self {
        let items = store.load();
        Self { store, items }
    }

    /// Append a copy of `item` and persist the whole list
    pub fn push(&mut self, item: T) {
        self.items = append(&self.items, item);
        self.store.persist(&self.items);
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn store(&self) -> &ListStore<T, S> {
        &self.store
    }
}
