//! Remote Layer - Core Traits
//!
//! Abstract interfaces to the dashboard API. The HTTP client implements them
//! for production; tests substitute in-memory fakes.
//!
//! Futures are `?Send`: every call is awaited on the single UI thread.

use async_trait::async_trait;

use crate::domain::{Alert, Entity, SyncResult};

/// Remote read of a whole collection
#[async_trait(?Send)]
pub trait Fetcher<T: Entity> {
    async fn fetch(&self) -> SyncResult<Vec<T>>;
}

/// Remote CRUD for one entity family
#[async_trait(?Send)]
pub trait RemoteRepository<T: Entity>: Fetcher<T> {
    /// Create; the server assigns the id of the returned record
    async fn create(&self, entity: &T) -> SyncResult<T>;

    /// `Ok(None)` when the server reports not-found
    async fn find_by_id(&self, id: &str) -> SyncResult<Option<T>>;

    async fn update(&self, entity: &T) -> SyncResult<T>;

    async fn delete(&self, id: &str) -> SyncResult<()>;
}

/// Alert reads plus the read-state writes
#[async_trait(?Send)]
pub trait AlertsApi: Fetcher<Alert> {
    async fn mark_as_read(&self, id: &str) -> SyncResult<Alert>;

    async fn mark_all_read(&self) -> SyncResult<()>;
}
