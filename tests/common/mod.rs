//! In-memory remotes for integration tests
//!
//! Both fakes are cheap handles over shared state, so a test keeps one
//! clone for inspection after handing another to the component under test.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use dashboard_sync::api::{AlertsApi, Fetcher, RemoteRepository};
use dashboard_sync::domain::{Alert, AlertKind, Entity, SyncError, SyncResult};
use tokio::sync::oneshot;

/// Let spawned local tasks run until they block
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// A response the test releases explicitly
#[derive(Default)]
pub struct Gate {
    rx: RefCell<Option<oneshot::Receiver<()>>>,
}

impl Gate {
    /// Arm the gate; the next call waits until the sender fires or drops
    pub fn arm(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.rx.borrow_mut() = Some(rx);
        tx
    }

    pub async fn pass(&self) {
        let rx = self.rx.borrow_mut().take();
        if let Some(rx) = rx {
            let _ = rx.await;
        }
    }
}

struct RemoteState<T> {
    items: RefCell<Vec<T>>,
    fail_next_write: RefCell<Option<SyncError>>,
    fail_fetch: RefCell<Option<SyncError>>,
    write_gate: Gate,
    next_id: Cell<u32>,
    calls: RefCell<Vec<String>>,
}

/// Server for one entity family
pub struct FakeRemote<T> {
    state: Rc<RemoteState<T>>,
}

impl<T> Clone for FakeRemote<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: Entity> FakeRemote<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            state: Rc::new(RemoteState {
                items: RefCell::new(items),
                fail_next_write: RefCell::new(None),
                fail_fetch: RefCell::new(None),
                write_gate: Gate::default(),
                next_id: Cell::new(1),
                calls: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn server_items(&self) -> Vec<T> {
        self.state.items.borrow().clone()
    }

    pub fn set_server_items(&self, items: Vec<T>) {
        *self.state.items.borrow_mut() = items;
    }

    pub fn fail_next_write(&self, err: SyncError) {
        *self.state.fail_next_write.borrow_mut() = Some(err);
    }

    pub fn fail_fetch(&self, err: Option<SyncError>) {
        *self.state.fail_fetch.borrow_mut() = err;
    }

    pub fn hold_next_write(&self) -> oneshot::Sender<()> {
        self.state.write_gate.arm()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.calls.borrow().clone()
    }

    async fn write(&self, call: String) -> SyncResult<()> {
        self.state.calls.borrow_mut().push(call);
        self.state.write_gate.pass().await;
        match self.state.fail_next_write.borrow_mut().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait(?Send)]
impl<T: Entity> Fetcher<T> for FakeRemote<T> {
    async fn fetch(&self) -> SyncResult<Vec<T>> {
        self.state.calls.borrow_mut().push("fetch".into());
        if let Some(err) = self.state.fail_fetch.borrow().clone() {
            return Err(err);
        }
        Ok(self.server_items())
    }
}

#[async_trait(?Send)]
impl<T: Entity> RemoteRepository<T> for FakeRemote<T> {
    async fn create(&self, entity: &T) -> SyncResult<T> {
        self.write("create".into()).await?;
        let mut created = entity.clone();
        let id = self.state.next_id.get();
        self.state.next_id.set(id + 1);
        created.set_id(format!("srv-{}", id));
        self.state.items.borrow_mut().push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> SyncResult<Option<T>> {
        self.state.calls.borrow_mut().push(format!("find {}", id));
        Ok(self.state.items.borrow().iter().find(|i| i.id() == id).cloned())
    }

    async fn update(&self, entity: &T) -> SyncResult<T> {
        self.write(format!("update {}", entity.id())).await?;
        let mut items = self.state.items.borrow_mut();
        let slot = items
            .iter_mut()
            .find(|i| i.id() == entity.id())
            .ok_or_else(|| SyncError::NotFound(entity.id().to_string()))?;
        *slot = entity.clone();
        Ok(entity.clone())
    }

    async fn delete(&self, id: &str) -> SyncResult<()> {
        self.write(format!("delete {}", id)).await?;
        self.state.items.borrow_mut().retain(|i| i.id() != id);
        Ok(())
    }
}

pub fn alert(id: &str, is_read: bool) -> Alert {
    let mut alert = Alert::new(id, AlertKind::Warning, format!("Alert {}", id));
    alert.is_read = is_read;
    alert.created_at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    alert
}

struct AlertsState {
    server: RefCell<Vec<Alert>>,
    fetch_calls: Cell<usize>,
    fail_fetch: Cell<bool>,
    fail_writes: Cell<bool>,
    fetch_gate: Gate,
    write_gate: Gate,
}

/// Alerts endpoint with read-state writes
#[derive(Clone)]
pub struct FakeAlerts {
    state: Rc<AlertsState>,
}

impl FakeAlerts {
    pub fn new(server: Vec<Alert>) -> Self {
        Self {
            state: Rc::new(AlertsState {
                server: RefCell::new(server),
                fetch_calls: Cell::new(0),
                fail_fetch: Cell::new(false),
                fail_writes: Cell::new(false),
                fetch_gate: Gate::default(),
                write_gate: Gate::default(),
            }),
        }
    }

    pub fn fetch_calls(&self) -> usize {
        self.state.fetch_calls.get()
    }

    pub fn set_server(&self, alerts: Vec<Alert>) {
        *self.state.server.borrow_mut() = alerts;
    }

    pub fn server(&self) -> Vec<Alert> {
        self.state.server.borrow().clone()
    }

    pub fn fail_fetch(&self, fail: bool) {
        self.state.fail_fetch.set(fail);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.fail_writes.set(fail);
    }

    pub fn hold_next_fetch(&self) -> oneshot::Sender<()> {
        self.state.fetch_gate.arm()
    }

    pub fn hold_next_write(&self) -> oneshot::Sender<()> {
        self.state.write_gate.arm()
    }

    async fn write(&self) -> SyncResult<()> {
        self.state.write_gate.pass().await;
        if self.state.fail_writes.get() {
            return Err(SyncError::NetworkFailure("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl Fetcher<Alert> for FakeAlerts {
    async fn fetch(&self) -> SyncResult<Vec<Alert>> {
        self.state.fetch_calls.set(self.state.fetch_calls.get() + 1);
        // snapshot taken when the request is sent
        let snapshot = self.server();
        self.state.fetch_gate.pass().await;
        if self.state.fail_fetch.get() {
            return Err(SyncError::NetworkFailure("timed out".into()));
        }
        Ok(snapshot)
    }
}

#[async_trait(?Send)]
impl AlertsApi for FakeAlerts {
    async fn mark_as_read(&self, id: &str) -> SyncResult<Alert> {
        self.write().await?;
        let mut server = self.state.server.borrow_mut();
        let alert = server
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| SyncError::NotFound(format!("Alert {} not found", id)))?;
        alert.is_read = true;
        Ok(alert.clone())
    }

    async fn mark_all_read(&self) -> SyncResult<()> {
        self.write().await?;
        for alert in self.state.server.borrow_mut().iter_mut() {
            alert.is_read = true;
        }
        Ok(())
    }
}
