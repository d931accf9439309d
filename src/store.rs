//! Entity Store
//!
//! In-memory cache of one server-owned collection, keyed by entity id.
//! Mutation is synchronous and unlocked: every store lives on the single
//! logical UI thread and is shared through `Rc<RefCell<_>>` handles whose
//! borrows never span an `.await`.

use std::cell::RefCell;
use std::rc::Rc;

use crate::domain::{Entity, SyncError, SyncResult};

/// Id-keyed cache that the optimistic mutator can drive
pub trait EntityCache<T: Entity> {
    fn find(&self, id: &str) -> Option<&T>;

    /// Replace the entry with the same id, or insert it
    fn upsert(&mut self, entity: T);

    fn remove(&mut self, id: &str) -> Option<T>;

    /// Swap the whole collection for a fetched snapshot
    fn replace_all(&mut self, items: Vec<T>);
}

/// Shared handle to a store owned by a screen or session
pub type StoreHandle<S> = Rc<RefCell<S>>;

pub fn new_handle<S>(store: S) -> StoreHandle<S> {
    Rc::new(RefCell::new(store))
}

/// Typed holder of exactly one id→entity mapping
///
/// Entries keep insertion order so derived views over an unchanged store are
/// reproducible; callers that care about order sort through the view pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityStore<T> {
    items: Vec<T>,
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> EntityStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a fetched list; a later duplicate id replaces an earlier one
    pub fn from_items(items: Vec<T>) -> Self {
        let mut store = Self::new();
        store.replace_all(items);
        store
    }

    pub fn get(&self, id: &str) -> SyncResult<&T> {
        self.find(id)
            .ok_or_else(|| SyncError::NotFound(format!("entity {}", id)))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn list(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T: Entity> EntityCache<T> for EntityStore<T> {
    fn find(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    fn upsert(&mut self, entity: T) {
        match self.items.iter_mut().find(|item| item.id() == entity.id()) {
            Some(slot) => *slot = entity,
            None => self.items.push(entity),
        }
    }

    fn remove(&mut self, id: &str) -> Option<T> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(index))
    }

    fn replace_all(&mut self, items: Vec<T>) {
        self.items.clear();
        for item in items {
            self.upsert(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Reminder;

    fn reminder(id: &str, description: &str) -> Reminder {
        Reminder::new(id, "acc-1", description)
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let mut store = EntityStore::new();
        store.upsert(reminder("r1", "Call Acme"));
        store.upsert(reminder("r2", "Send deck"));
        store.upsert(reminder("r1", "Call Acme again"));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("r1").unwrap().description, "Call Acme again");
        let ids: Vec<&str> = store.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2"]);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let store: EntityStore<Reminder> = EntityStore::new();
        assert!(matches!(store.get("nope"), Err(SyncError::NotFound(_))));
    }

    #[test]
    fn test_remove_returns_entry() {
        let mut store = EntityStore::from_items(vec![reminder("r1", "a"), reminder("r2", "b")]);

        let removed = store.remove("r1").expect("r1 present");
        assert_eq!(removed.description, "a");
        assert!(!store.contains("r1"));
        assert!(store.remove("r1").is_none());
    }

    #[test]
    fn test_replace_all_dedupes_ids() {
        let mut store = EntityStore::from_items(vec![reminder("old", "gone")]);
        store.replace_all(vec![reminder("r1", "first"), reminder("r1", "second")]);

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("r1").unwrap().description, "second");
        assert!(!store.contains("old"));
    }
}
