//! Dashboard Session
//!
//! Owns one collection per entity family, the alert poller and the API
//! client. Screens borrow what they need from the session instead of
//! reaching for global state.

use std::path::Path;

use log::info;

use crate::aggregate::{risky_accounts, summarize, PortfolioSummary, RiskyAccount};
use crate::api::{ApiClient, HealthApi, HttpRepository};
use crate::collection::Collection;
use crate::config::ClientConfig;
use crate::domain::{Account, Alert, Contract, Document, HealthScore, Input, Reminder, SyncResult};
use crate::notifications::NotificationStore;
use crate::poller::Poller;
use crate::store::{new_handle, EntityCache};

pub type HttpCollection<T> = Collection<T, HttpRepository<T>>;

pub struct DashboardSession {
    config: ClientConfig,
    client: ApiClient,
    pub accounts: HttpCollection<Account>,
    pub contracts: HttpCollection<Contract>,
    pub inputs: HttpCollection<Input>,
    pub reminders: HttpCollection<Reminder>,
    pub documents: HttpCollection<Document>,
    pub health: HealthApi,
    pub alerts: Poller<HttpRepository<Alert>>,
}

impl DashboardSession {
    /// Wire every component to one API client; nothing is fetched yet
    pub fn connect(config: ClientConfig) -> SyncResult<Self> {
        config.validate()?;
        let client = ApiClient::new(&config)?;
        info!("event=session_connected base_url={}", client.base_url());

        Ok(Self {
            accounts: Collection::new(HttpRepository::new(client.clone())),
            contracts: Collection::new(HttpRepository::new(client.clone())),
            inputs: Collection::new(HttpRepository::new(client.clone())),
            reminders: Collection::new(HttpRepository::new(client.clone())),
            documents: Collection::new(HttpRepository::new(client.clone())),
            health: HealthApi::new(client.clone()),
            alerts: Poller::new(
                HttpRepository::new(client.clone()),
                new_handle(NotificationStore::new()),
            ),
            client,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Start alert polling at the configured interval
    ///
    /// # Panics
    /// Outside a `LocalSet`.
    pub fn start_polling(&mut self) -> SyncResult<()> {
        self.alerts.start(self.config.poll_interval())
    }

    pub fn stop_polling(&mut self) {
        self.alerts.stop();
    }

    /// Refresh accounts and contracts for the home screen
    pub async fn refresh_portfolio(&self) -> SyncResult<()> {
        self.accounts.refresh().await?;
        self.contracts.refresh().await?;
        Ok(())
    }

    async fn active_scores(&self) -> SyncResult<(Vec<Account>, Vec<HealthScore>)> {
        let accounts = self.accounts.snapshot();
        let active: Vec<Account> = accounts.iter().filter(|a| a.is_active).cloned().collect();
        let scores = self.health.latest_for(&active).await?;
        Ok((accounts, scores))
    }

    /// Home screen summary from the current account and contract stores
    pub async fn portfolio_summary(&self) -> SyncResult<PortfolioSummary> {
        let (accounts, scores) = self.active_scores().await?;
        let contracts = self.contracts.snapshot();
        Ok(summarize(
            &accounts,
            &scores,
            &contracts,
            self.config.renewal_window_days,
        ))
    }

    pub async fn risky_accounts(&self) -> SyncResult<Vec<RiskyAccount>> {
        let (accounts, scores) = self.active_scores().await?;
        Ok(risky_accounts(&accounts, &scores))
    }

    /// Upload a file for an account and add the record to the document store
    pub async fn attach_document(&self, account_id: &str, path: &Path) -> SyncResult<Document> {
        let document = self.documents.remote().upload_file(account_id, path).await?;
        self.documents.store().borrow_mut().upsert(document.clone());
        Ok(document)
    }
}
