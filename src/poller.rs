//! Alert Poller
//!
//! Keeps the [`NotificationStore`] fresh by re-fetching the whole alert
//! collection on a fixed interval, and applies read-state changes
//! optimistically in between.
//!
//! # Stale results
//! A fetch that was in flight while something newer happened never
//! overwrites the store. Its result is dropped when:
//! - `stop()` was called after the fetch began,
//! - a local read-state write started or resolved during the fetch,
//! - a read-state write is still pending when the fetch returns.
//!
//! The out-of-cycle refresh that follows every write picks up the server's
//! view afterwards.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::api::AlertsApi;
use crate::domain::{Alert, SyncError, SyncResult};
use crate::mutation::{Mutation, OptimisticMutator};
use crate::notifications::NotificationStore;
use crate::store::{EntityCache, StoreHandle};

/// Interval used by the dashboard when none is configured
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// State shared between the poller handle and its background task
struct PollCore<A> {
    api: Rc<A>,
    notifications: StoreHandle<NotificationStore>,
    mutator: OptimisticMutator<Alert, NotificationStore>,
    /// Bumped by `stop()`; a fetch started under an older epoch is stale
    epoch: Rc<Cell<u64>>,
    /// Bumped when a local read-state write starts and when it resolves
    write_seq: Rc<Cell<u64>>,
    bulk_pending: Rc<Cell<bool>>,
}

impl<A> Clone for PollCore<A> {
    fn clone(&self) -> Self {
        Self {
            api: Rc::clone(&self.api),
            notifications: Rc::clone(&self.notifications),
            mutator: self.mutator.clone(),
            epoch: Rc::clone(&self.epoch),
            write_seq: Rc::clone(&self.write_seq),
            bulk_pending: Rc::clone(&self.bulk_pending),
        }
    }
}

impl<A: AlertsApi> PollCore<A> {
    fn bump_writes(&self) {
        self.write_seq.set(self.write_seq.get().wrapping_add(1));
    }

    /// Fetch once; `Ok(false)` when the result was stale and dropped
    async fn refresh(&self) -> SyncResult<bool> {
        let epoch = self.epoch.get();
        let seq = self.write_seq.get();

        let fetched = self.api.fetch().await?;

        if epoch != self.epoch.get() {
            debug!("event=poll_discarded reason=stopped");
            return Ok(false);
        }
        if seq != self.write_seq.get() || self.mutator.has_pending() || self.bulk_pending.get() {
            debug!("event=poll_discarded reason=local_write");
            return Ok(false);
        }

        let mut store = self.notifications.borrow_mut();
        store.replace_all(fetched);
        debug!(
            "event=poll_applied alerts={} unread={}",
            store.len(),
            store.unread_count()
        );
        Ok(true)
    }

    async fn tick(&self) {
        match self.refresh().await {
            Err(err) if err.is_transient() => warn!("event=poll_failed error={}", err),
            Err(err) => error!("event=poll_failed transient=false error={}", err),
            Ok(_) => {}
        }
    }
}

/// Undoes an optimistic mark-all-read unless committed
struct BulkWrite<'a, A: AlertsApi> {
    core: &'a PollCore<A>,
    flipped: Vec<String>,
    committed: bool,
}

impl<'a, A: AlertsApi> BulkWrite<'a, A> {
    fn begin(core: &'a PollCore<A>) -> Self {
        core.bulk_pending.set(true);
        core.bump_writes();
        let flipped = core.notifications.borrow_mut().mark_all_read();
        Self {
            core,
            flipped,
            committed: false,
        }
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl<A: AlertsApi> Drop for BulkWrite<'_, A> {
    fn drop(&mut self) {
        if !self.committed {
            self.core.notifications.borrow_mut().mark_unread(&self.flipped);
            warn!("event=mark_all_read_rolled_back alerts={}", self.flipped.len());
        }
        self.core.bulk_pending.set(false);
        self.core.bump_writes();
    }
}

/// Periodic alert fetcher bound to one notification store
///
/// The background task is spawned with `spawn_local`, so `start` must run
/// inside a `tokio::task::LocalSet`.
pub struct Poller<A: AlertsApi + 'static> {
    core: PollCore<A>,
    task: Option<JoinHandle<()>>,
}

impl<A: AlertsApi + 'static> Poller<A> {
    pub fn new(api: A, notifications: StoreHandle<NotificationStore>) -> Self {
        Self {
            core: PollCore {
                api: Rc::new(api),
                mutator: OptimisticMutator::new(Rc::clone(&notifications)),
                notifications,
                epoch: Rc::new(Cell::new(0)),
                write_seq: Rc::new(Cell::new(0)),
                bulk_pending: Rc::new(Cell::new(false)),
            },
            task: None,
        }
    }

    pub fn notifications(&self) -> &StoreHandle<NotificationStore> {
        &self.core.notifications
    }

    pub fn unread_count(&self) -> usize {
        self.core.notifications.borrow().unread_count()
    }

    pub fn badge_label(&self) -> String {
        self.core.notifications.borrow().badge_label()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Begin polling every `interval`; the first fetch happens immediately
    ///
    /// Restarts the schedule when already running.
    ///
    /// # Panics
    /// Outside a `LocalSet`.
    pub fn start(&mut self, interval: Duration) -> SyncResult<()> {
        if interval.is_zero() {
            return Err(SyncError::ValidationFailure(
                "poll interval must be positive".into(),
            ));
        }
        self.stop();

        let core = self.core.clone();
        let epoch = core.epoch.get();
        self.task = Some(tokio::task::spawn_local(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if core.epoch.get() != epoch {
                    break;
                }
                core.tick().await;
            }
        }));
        info!("event=poller_started interval_ms={}", interval.as_millis());
        Ok(())
    }

    /// Cancel polling; an in-flight fetch is dropped and never applied
    pub fn stop(&mut self) {
        self.core.epoch.set(self.core.epoch.get().wrapping_add(1));
        if let Some(task) = self.task.take() {
            task.abort();
            info!("event=poller_stopped");
        }
    }

    /// One out-of-cycle fetch; `Ok(false)` when its result was stale
    pub async fn refresh(&self) -> SyncResult<bool> {
        self.core.refresh().await
    }

    /// Mark one alert read, then re-fetch
    ///
    /// Already-read alerts are left alone. On failure the flag is restored,
    /// the re-fetch still runs and the write's error is returned.
    pub async fn mark_as_read(&self, id: &str) -> SyncResult<()> {
        if self.core.bulk_pending.get() {
            return Err(SyncError::Conflict("mark-all-read is pending".into()));
        }
        let current = self
            .core
            .notifications
            .borrow()
            .find(id)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(format!("alert {}", id)))?;
        if current.is_read {
            return Ok(());
        }

        let mut read = current;
        read.is_read = true;
        let api = Rc::clone(&self.core.api);
        let alert_id = id.to_string();

        self.core.bump_writes();
        let outcome = self
            .core
            .mutator
            .apply(Mutation::Update(read), async move {
                api.mark_as_read(&alert_id).await.map(Some)
            })
            .await;
        self.core.bump_writes();

        self.refresh_after_write().await;
        outcome.map(|_| ())
    }

    /// Mark every alert read, then re-fetch
    pub async fn mark_all_read(&self) -> SyncResult<()> {
        if self.core.bulk_pending.get() || self.core.mutator.has_pending() {
            return Err(SyncError::Conflict("a read-state write is pending".into()));
        }

        let write = BulkWrite::begin(&self.core);
        let outcome = self.core.api.mark_all_read().await;
        if outcome.is_ok() {
            info!("event=mark_all_read alerts={}", write.flipped.len());
            write.commit();
        } else {
            drop(write);
        }

        self.refresh_after_write().await;
        outcome
    }

    async fn refresh_after_write(&self) {
        if let Err(err) = self.core.refresh().await {
            warn!("event=refresh_after_write_failed error={}", err);
        }
    }
}

impl<A: AlertsApi + 'static> Drop for Poller<A> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
