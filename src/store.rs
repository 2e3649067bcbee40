//! Process-local key/value store.
//!
//! Every read and write goes through one [`Mutex`]. Operations copy data in
//! or out and release the lock before returning, so no caller ever holds it
//! across an `.await`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use crate::user::User;

/// The store the user handlers run against.
pub type UserStore = Store<User>;

/// An in-memory map from generated identifier to owned value.
///
/// Iteration order of [`Store::list`] is unspecified.
#[derive(Debug)]
pub struct Store<T> {
    entries: Mutex<HashMap<Uuid, T>>,
}

impl<T: Clone> Store<T> {
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }

    /// Returns a copy of the value stored under `id`.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.lock().get(id).cloned()
    }

    /// Inserts or overwrites the value under `id`, returning the value it
    /// replaced.
    pub fn put(&self, id: Uuid, value: T) -> Option<T> {
        self.lock().insert(id, value)
    }

    /// Stores `value` under a freshly minted random identifier.
    pub fn insert(&self, value: T) -> Uuid {
        let mut entries = self.lock();
        let mut id = Uuid::new_v4();
        while entries.contains_key(&id) {
            id = Uuid::new_v4();
        }
        entries.insert(id, value);
        id
    }

    /// Removes `id`. Returns `true` if it was present.
    pub fn delete(&self, id: &Uuid) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Snapshot of every entry.
    pub fn list(&self) -> Vec<(Uuid, T)> {
        self.lock()
            .iter()
            .map(|(id, value)| (*id, value.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // The map only holds plain data, so a panic elsewhere can't leave it
    // half-updated; keep serving from a poisoned lock.
    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, T>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Default for Store<T> {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get() {
        let store = Store::new();
        let id = store.insert("alice".to_owned());
        assert_eq!(store.get(&id).as_deref(), Some("alice"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn get_unknown_id_is_none() {
        let store: Store<String> = Store::new();
        assert!(store.get(&Uuid::new_v4()).is_none());
    }

    #[test]
    fn insert_mints_distinct_ids() {
        let store = Store::new();
        let a = store.insert(1);
        let b = store.insert(1);
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn put_reports_replaced_value() {
        let store = Store::new();
        let id = Uuid::new_v4();
        assert_eq!(store.put(id, 1), None);
        assert_eq!(store.put(id, 2), Some(1));
        assert_eq!(store.get(&id), Some(2));
    }

    #[test]
    fn delete_reports_presence() {
        let store = Store::new();
        let id = store.insert(7);
        assert!(store.delete(&id));
        assert!(!store.delete(&id));
        assert!(store.is_empty());
    }

    #[test]
    fn list_returns_every_entry() {
        let store = Store::new();
        let a = store.insert("a");
        let b = store.insert("b");
        let mut listed = store.list();
        listed.sort_by_key(|(_, v)| *v);
        assert_eq!(listed, vec![(a, "a"), (b, "b")]);
    }

    #[test]
    fn concurrent_inserts_are_all_kept() {
        let store = std::sync::Arc::new(Store::new());
        let handles: Vec<_> = (0..8)
            .map(|n| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        store.insert(n * 100 + i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 800);
    }

    #[test]
    fn poisoned_lock_keeps_serving() {
        let store = Store::new();
        let id = store.insert(1);

        let poisoned = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.entries.lock().unwrap();
            panic!("panic while holding the store lock");
        }));
        assert!(poisoned.is_err());
        assert!(store.entries.is_poisoned());

        assert_eq!(store.get(&id), Some(1));
        assert_eq!(store.put(id, 2), Some(1));
        assert_eq!(store.get(&id), Some(2));
        assert_eq!(store.len(), 1);
    }
}
