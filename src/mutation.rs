//! Optimistic Mutator
//!
//! Applies a user change to a store immediately, issues the matching remote
//! write and reconciles when it resolves:
//!
//! ```text
//! idle --apply--> pending --remote ok--> confirmed
//!                    \-----remote err--> rolled back
//! ```
//!
//! # Invariants
//! - At most one pending mutation per id; a second one is rejected with
//!   `Conflict` before it touches the store.
//! - The optimistic write (before the await) and the resolution (after it)
//!   each complete without yielding.
//! - A failed or cancelled write leaves the store exactly as it was before
//!   the mutation was applied.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use log::{debug, info, warn};

use crate::domain::{placeholder_id, Entity, SyncError, SyncResult};
use crate::store::{EntityCache, EntityStore, StoreHandle};

/// A change requested by the user
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation<T> {
    /// Insert; an empty id is replaced by a placeholder until the server answers
    Create(T),
    /// Replace the entry with the same id
    Update(T),
    Delete(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        }
    }
}

/// One in-flight optimistic change and its rollback point
#[derive(Debug, Clone, PartialEq)]
pub enum PendingMutation<T> {
    /// Nothing existed before; rollback removes the entry
    Create { id: String },
    Update { id: String, previous: T },
    Delete { id: String, previous: T },
}

impl<T> PendingMutation<T> {
    pub fn id(&self) -> &str {
        match self {
            PendingMutation::Create { id }
            | PendingMutation::Update { id, .. }
            | PendingMutation::Delete { id, .. } => id,
        }
    }

    pub fn kind(&self) -> MutationKind {
        match self {
            PendingMutation::Create { .. } => MutationKind::Create,
            PendingMutation::Update { .. } => MutationKind::Update,
            PendingMutation::Delete { .. } => MutationKind::Delete,
        }
    }
}

/// Drives optimistic writes against one store
pub struct OptimisticMutator<T, S = EntityStore<T>> {
    store: StoreHandle<S>,
    pending: Rc<RefCell<Vec<PendingMutation<T>>>>,
}

impl<T, S> Clone for OptimisticMutator<T, S> {
    fn clone(&self) -> Self {
        Self {
            store: Rc::clone(&self.store),
            pending: Rc::clone(&self.pending),
        }
    }
}

impl<T: Entity, S: EntityCache<T>> OptimisticMutator<T, S> {
    pub fn new(store: StoreHandle<S>) -> Self {
        Self {
            store,
            pending: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn store(&self) -> &StoreHandle<S> {
        &self.store
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.borrow().iter().any(|p| p.id() == id)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.borrow().is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Snapshot of the pending record for `id`
    pub fn pending(&self, id: &str) -> Option<PendingMutation<T>> {
        self.pending.borrow().iter().find(|p| p.id() == id).cloned()
    }

    /// Apply `mutation` locally, await `remote`, then confirm or roll back
    ///
    /// `remote` resolves to the server's authoritative value when it returns
    /// one (e.g. a created record with its server id). Returns the entry held
    /// by the store after confirmation (`None` for deletes).
    ///
    /// # Errors
    /// - `Conflict` when `id` already has a pending mutation.
    /// - `NotFound` when updating or deleting an id the store does not hold.
    /// - The remote failure, after the store has been rolled back.
    pub async fn apply<F>(&self, mutation: Mutation<T>, remote: F) -> SyncResult<Option<T>>
    where
        F: Future<Output = SyncResult<Option<T>>>,
    {
        let id = self.begin(mutation)?;
        let guard = RollbackOnDrop {
            mutator: self,
            id: &id,
            armed: true,
        };
        let outcome = remote.await;
        guard.defuse();
        self.resolve(&id, outcome)
    }

    /// Replace the store with a fetched snapshot, keeping optimistic entries
    ///
    /// Ids with a pending mutation keep their local value (or stay absent
    /// for a pending delete); pending creates the server has not seen yet are
    /// appended in the order they were made.
    pub fn reconcile(&self, fetched: Vec<T>) {
        let pending = self.pending.borrow();
        let mut store = self.store.borrow_mut();

        let mut merged = Vec::with_capacity(fetched.len() + pending.len());
        for item in fetched {
            if pending.iter().any(|p| p.id() == item.id()) {
                if let Some(current) = store.find(item.id()) {
                    merged.push(current.clone());
                }
            } else {
                merged.push(item);
            }
        }
        for p in pending.iter() {
            if merged.iter().any(|item| item.id() == p.id()) {
                continue;
            }
            if let Some(current) = store.find(p.id()) {
                merged.push(current.clone());
            }
        }

        debug!(
            "event=reconcile entries={} pending={}",
            merged.len(),
            pending.len()
        );
        store.replace_all(merged);
    }

    fn begin(&self, mutation: Mutation<T>) -> SyncResult<String> {
        let target = match &mutation {
            Mutation::Create(entity) | Mutation::Update(entity) => entity.id().to_string(),
            Mutation::Delete(id) => id.clone(),
        };
        if !target.is_empty() && self.is_pending(&target) {
            return Err(SyncError::Conflict(format!(
                "entity {} already has a pending mutation",
                target
            )));
        }

        let mut store = self.store.borrow_mut();
        let pending = match mutation {
            Mutation::Create(mut entity) => {
                if entity.id().is_empty() {
                    entity.set_id(placeholder_id());
                } else if store.find(entity.id()).is_some() {
                    return Err(SyncError::Conflict(format!(
                        "entity {} already exists",
                        entity.id()
                    )));
                }
                let id = entity.id().to_string();
                store.upsert(entity);
                PendingMutation::Create { id }
            }
            Mutation::Update(entity) => {
                let previous = store
                    .find(entity.id())
                    .cloned()
                    .ok_or_else(|| SyncError::NotFound(format!("entity {}", entity.id())))?;
                let id = entity.id().to_string();
                store.upsert(entity);
                PendingMutation::Update { id, previous }
            }
            Mutation::Delete(id) => {
                let previous = store
                    .remove(&id)
                    .ok_or_else(|| SyncError::NotFound(format!("entity {}", id)))?;
                PendingMutation::Delete { id, previous }
            }
        };

        let id = pending.id().to_string();
        debug!("event=mutation_pending kind={} id={}", pending.kind().as_str(), id);
        self.pending.borrow_mut().push(pending);
        Ok(id)
    }

    fn take_pending(&self, id: &str) -> Option<PendingMutation<T>> {
        let mut pending = self.pending.borrow_mut();
        let index = pending.iter().position(|p| p.id() == id)?;
        Some(pending.remove(index))
    }

    fn resolve(&self, id: &str, outcome: SyncResult<Option<T>>) -> SyncResult<Option<T>> {
        let Some(pending) = self.take_pending(id) else {
            return Err(SyncError::Unknown(format!(
                "no pending mutation recorded for {}",
                id
            )));
        };

        match outcome {
            Ok(confirmed) => {
                let mut store = self.store.borrow_mut();
                let current = match (&pending, confirmed) {
                    (PendingMutation::Delete { .. }, _) => None,
                    (_, Some(mut authoritative)) => {
                        if authoritative.id().is_empty() {
                            authoritative.set_id(id.to_string());
                        }
                        if authoritative.id() != id {
                            store.remove(id);
                        }
                        store.upsert(authoritative.clone());
                        Some(authoritative)
                    }
                    (_, None) => store.find(id).cloned(),
                };
                info!(
                    "event=mutation_confirmed kind={} id={}",
                    pending.kind().as_str(),
                    current.as_ref().map(|c| c.id()).unwrap_or(id)
                );
                Ok(current)
            }
            Err(err) => {
                let kind = pending.kind();
                self.restore(pending);
                warn!(
                    "event=mutation_rolled_back kind={} id={} error={}",
                    kind.as_str(),
                    id,
                    err
                );
                Err(err)
            }
        }
    }

    fn restore(&self, pending: PendingMutation<T>) {
        let mut store = self.store.borrow_mut();
        match pending {
            PendingMutation::Create { id } => {
                store.remove(&id);
            }
            PendingMutation::Update { previous, .. } | PendingMutation::Delete { previous, .. } => {
                store.upsert(previous);
            }
        }
    }
}

/// Rolls a mutation back if its `apply` future is dropped mid-flight
struct RollbackOnDrop<'a, T: Entity, S: EntityCache<T>> {
    mutator: &'a OptimisticMutator<T, S>,
    id: &'a str,
    armed: bool,
}

impl<T: Entity, S: EntityCache<T>> RollbackOnDrop<'_, T, S> {
    fn defuse(mut self) {
        self.armed = false;
    }
}

impl<T: Entity, S: EntityCache<T>> Drop for RollbackOnDrop<'_, T, S> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(pending) = self.mutator.take_pending(self.id) {
            warn!("event=mutation_cancelled kind={} id={}", pending.kind().as_str(), self.id);
            self.mutator.restore(pending);
        }
    }
}
