//! Entity Family Repository
//!
//! Generic HTTP implementation of [`RemoteRepository`] over the
//! `/<family>/` and `/<family>/<id>` routes.

use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::client::ApiClient;
use super::traits::{Fetcher, RemoteRepository};
use crate::domain::{
    is_placeholder_id, Account, Alert, Contract, Document, Entity, Input, Reminder, SyncError,
    SyncResult,
};

/// Entity that lives under its own API family
pub trait RemoteEntity: Entity + Serialize + DeserializeOwned {
    /// Path segment, e.g. `accounts`
    const FAMILY: &'static str;
    /// Whether requests carry the bearer token
    const AUTHENTICATED: bool = false;
}

impl RemoteEntity for Account {
    const FAMILY: &'static str = "accounts";
}

impl RemoteEntity for Contract {
    const FAMILY: &'static str = "contracts";
    const AUTHENTICATED: bool = true;
}

impl RemoteEntity for Input {
    const FAMILY: &'static str = "inputs";
}

impl RemoteEntity for Reminder {
    const FAMILY: &'static str = "reminders";
}

impl RemoteEntity for Alert {
    const FAMILY: &'static str = "alerts";
}

impl RemoteEntity for Document {
    const FAMILY: &'static str = "documents";
    const AUTHENTICATED: bool = true;
}

/// HTTP repository for one entity family
pub struct HttpRepository<T> {
    client: ApiClient,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for HttpRepository<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: RemoteEntity> HttpRepository<T> {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            _entity: PhantomData,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub(crate) fn collection_path() -> String {
        format!("{}/", T::FAMILY)
    }

    pub(crate) fn record_path(id: &str) -> String {
        format!("{}/{}", T::FAMILY, id)
    }

    /// GET a list under this family, e.g. `accounts/<id>/children`
    pub(crate) async fn list_at(&self, path: &str) -> SyncResult<Vec<T>> {
        self.client.get_json(path, T::AUTHENTICATED).await
    }
}

/// Creation body: the record without a client placeholder id
pub(crate) fn creation_payload<T: Serialize + Entity>(entity: &T) -> SyncResult<Value> {
    let mut body = serde_json::to_value(entity)
        .map_err(|e| SyncError::ValidationFailure(format!("unserializable payload: {}", e)))?;
    if entity.id().is_empty() || is_placeholder_id(entity.id()) {
        if let Some(fields) = body.as_object_mut() {
            fields.remove("id");
        }
    }
    Ok(body)
}

#[async_trait(?Send)]
impl<T: RemoteEntity> Fetcher<T> for HttpRepository<T> {
    async fn fetch(&self) -> SyncResult<Vec<T>> {
        self.list_at(&Self::collection_path()).await
    }
}

#[async_trait(?Send)]
impl<T: RemoteEntity> RemoteRepository<T> for HttpRepository<T> {
    async fn create(&self, entity: &T) -> SyncResult<T> {
        let body = creation_payload(entity)?;
        self.client
            .send_json(Method::POST, &Self::collection_path(), &body, T::AUTHENTICATED)
            .await
    }

    async fn find_by_id(&self, id: &str) -> SyncResult<Option<T>> {
        match self.client.get_json(&Self::record_path(id), T::AUTHENTICATED).await {
            Ok(entity) => Ok(Some(entity)),
            Err(SyncError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn update(&self, entity: &T) -> SyncResult<T> {
        self.client
            .send_json(Method::PUT, &Self::record_path(entity.id()), entity, T::AUTHENTICATED)
            .await
    }

    async fn delete(&self, id: &str) -> SyncResult<()> {
        self.client
            .send_empty(Method::DELETE, &Self::record_path(id), T::AUTHENTICATED)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_follow_family() {
        assert_eq!(HttpRepository::<Account>::collection_path(), "accounts/");
        assert_eq!(HttpRepository::<Reminder>::record_path("r1"), "reminders/r1");
        assert!(Contract::AUTHENTICATED);
        assert!(!Alert::AUTHENTICATED);
    }

    #[test]
    fn test_creation_payload_drops_placeholder_id() {
        let mut reminder = Reminder::new("", "acc-1", "Follow up");
        reminder.set_id(crate::domain::placeholder_id());

        let body = creation_payload(&reminder).unwrap();
        assert!(body.get("id").is_none());
        assert_eq!(body["description"], "Follow up");
    }

    #[test]
    fn test_creation_payload_keeps_real_id() {
        let account = Account::new("acc-7", "Acme");
        let body = creation_payload(&account).unwrap();
        assert_eq!(body["id"], "acc-7");
    }
}
