//! Entity Collection
//!
//! One screen-facing bundle per entity family: the store, the optimistic
//! mutator over it and the remote repository it syncs with.

use std::rc::Rc;

use log::{debug, warn};

use crate::api::RemoteRepository;
use crate::domain::{Entity, SyncError, SyncResult};
use crate::mutation::{Mutation, OptimisticMutator};
use crate::store::{new_handle, EntityCache, EntityStore, StoreHandle};
use crate::view::{apply_view, ViewState, Viewable};

pub struct Collection<T: Entity, R> {
    mutator: OptimisticMutator<T>,
    remote: Rc<R>,
}

impl<T: Entity, R> Clone for Collection<T, R> {
    fn clone(&self) -> Self {
        Self {
            mutator: self.mutator.clone(),
            remote: Rc::clone(&self.remote),
        }
    }
}

impl<T: Entity, R: RemoteRepository<T> + 'static> Collection<T, R> {
    pub fn new(remote: R) -> Self {
        Self::with_store(remote, new_handle(EntityStore::new()))
    }

    pub fn with_store(remote: R, store: StoreHandle<EntityStore<T>>) -> Self {
        Self {
            mutator: OptimisticMutator::new(store),
            remote: Rc::new(remote),
        }
    }

    pub fn store(&self) -> &StoreHandle<EntityStore<T>> {
        self.mutator.store()
    }

    pub fn mutator(&self) -> &OptimisticMutator<T> {
        &self.mutator
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Fetch the whole family and reconcile it into the store
    ///
    /// On failure the previous snapshot stays untouched.
    pub async fn refresh(&self) -> SyncResult<usize> {
        let fetched = match self.remote.fetch().await {
            Ok(items) => items,
            Err(err) => {
                warn!("event=refresh_failed error={}", err);
                return Err(err);
            }
        };
        self.mutator.reconcile(fetched);
        let len = self.store().borrow().len();
        debug!("event=refresh_applied entries={}", len);
        Ok(len)
    }

    /// Re-read a single record from the server
    ///
    /// A record the server no longer has is dropped locally. Records with a
    /// pending mutation are left alone.
    pub async fn reload(&self, id: &str) -> SyncResult<Option<T>> {
        let found = self.remote.find_by_id(id).await?;
        if self.mutator.is_pending(id) {
            return Ok(self.store().borrow().find(id).cloned());
        }
        let mut store = self.store().borrow_mut();
        match &found {
            Some(entity) => store.upsert(entity.clone()),
            None => {
                store.remove(id);
            }
        }
        Ok(found)
    }

    pub fn get(&self, id: &str) -> SyncResult<T> {
        self.store().borrow().get(id).cloned()
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.store().borrow().list().to_vec()
    }

    /// Insert optimistically; resolves to the record under its server id
    pub async fn create(&self, entity: T) -> SyncResult<T> {
        let remote = Rc::clone(&self.remote);
        let payload = entity.clone();
        self.mutator
            .apply(Mutation::Create(entity), async move {
                remote.create(&payload).await.map(Some)
            })
            .await?
            .ok_or_else(|| SyncError::Unknown("create resolved without a record".into()))
    }

    pub async fn update(&self, entity: T) -> SyncResult<T> {
        let remote = Rc::clone(&self.remote);
        let payload = entity.clone();
        let id = entity.id().to_string();
        self.mutator
            .apply(Mutation::Update(entity), async move {
                remote.update(&payload).await.map(Some)
            })
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("entity {}", id)))
    }

    pub async fn delete(&self, id: &str) -> SyncResult<()> {
        let remote = Rc::clone(&self.remote);
        let target = id.to_string();
        self.mutator
            .apply(Mutation::Delete(id.to_string()), async move {
                remote.delete(&target).await.map(|_| None)
            })
            .await
            .map(|_| ())
    }
}

impl<T: Entity + Viewable, R: RemoteRepository<T> + 'static> Collection<T, R> {
    /// Current store contents through the view pipeline
    pub fn view(&self, state: &ViewState) -> Vec<T> {
        apply_view(self.store().borrow().list(), state)
    }
}
