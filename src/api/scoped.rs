//! Account-scoped reads
//!
//! Routes the account detail screen uses to load everything attached to a
//! single account, plus the health score history.

use reqwest::Method;

use super::client::ApiClient;
use super::family::{HttpRepository, RemoteEntity};
use crate::domain::{Account, Contract, Document, HealthScore, Input, Reminder, SyncResult};

impl HttpRepository<Account> {
    pub async fn children_of(&self, account_id: &str) -> SyncResult<Vec<Account>> {
        self.list_at(&format!("{}/{}/children", Account::FAMILY, account_id)).await
    }
}

impl HttpRepository<Contract> {
    pub async fn for_account(&self, account_id: &str) -> SyncResult<Vec<Contract>> {
        self.list_at(&format!("{}/accounts/{}/contracts", Contract::FAMILY, account_id)).await
    }
}

impl HttpRepository<Input> {
    pub async fn for_account(&self, account_id: &str) -> SyncResult<Vec<Input>> {
        self.list_at(&format!("{}/accounts/{}", Input::FAMILY, account_id)).await
    }
}

impl HttpRepository<Reminder> {
    pub async fn for_account(&self, account_id: &str) -> SyncResult<Vec<Reminder>> {
        self.list_at(&format!("{}/?account_id={}", Reminder::FAMILY, account_id)).await
    }
}

impl HttpRepository<Document> {
    pub async fn for_account(&self, account_id: &str) -> SyncResult<Vec<Document>> {
        self.list_at(&format!("{}/account/{}", Document::FAMILY, account_id)).await
    }
}

/// Health score routes; scores are computed server-side
#[derive(Debug, Clone)]
pub struct HealthApi {
    client: ApiClient,
}

impl HealthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Newest first
    pub async fn history(&self, account_id: &str) -> SyncResult<Vec<HealthScore>> {
        self.client
            .get_json(&format!("health/accounts/{}/history", account_id), false)
            .await
    }

    /// `None` when the account has never been scored
    pub async fn latest(&self, account_id: &str) -> SyncResult<Option<HealthScore>> {
        let history: Vec<HealthScore> = self
            .client
            .get_json(&format!("health/accounts/{}/history?limit=1", account_id), false)
            .await?;
        Ok(history.into_iter().next())
    }

    /// Ask the server to score the account now
    pub async fn calculate(&self, account_id: &str) -> SyncResult<HealthScore> {
        let path = format!("health/accounts/{}/calculate", account_id);
        self.client.send_for_json(Method::POST, &path, false).await
    }

    /// Latest score of each account that has one
    pub async fn latest_for(&self, accounts: &[Account]) -> SyncResult<Vec<HealthScore>> {
        let mut scores = Vec::with_capacity(accounts.len());
        for account in accounts {
            if let Some(score) = self.latest(&account.id).await? {
                scores.push(score);
            }
        }
        Ok(scores)
    }
}
