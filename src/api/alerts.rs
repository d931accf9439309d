//! Alert read-state routes

use async_trait::async_trait;
use reqwest::Method;

use super::family::{HttpRepository, RemoteEntity};
use super::traits::AlertsApi;
use crate::domain::{Alert, SyncResult};

#[async_trait(?Send)]
impl AlertsApi for HttpRepository<Alert> {
    async fn mark_as_read(&self, id: &str) -> SyncResult<Alert> {
        let path = format!("{}/{}/read", Alert::FAMILY, id);
        self.client()
            .send_for_json(Method::PUT, &path, Alert::AUTHENTICATED)
            .await
    }

    async fn mark_all_read(&self) -> SyncResult<()> {
        self.client()
            .send_empty(Method::PUT, &format!("{}/read-all", Alert::FAMILY), Alert::AUTHENTICATED)
            .await
    }
}
