//! Notification Store
//!
//! Alerts plus the unread badge count. The count is recomputed by every
//! method that touches the mapping, so it always equals the number of
//! entries with `is_read == false`.

use crate::domain::{Alert, Entity};
use crate::store::{EntityCache, EntityStore};

const BADGE_CAP: usize = 9;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationStore {
    alerts: EntityStore<Alert>,
    unread_count: usize,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_alerts(alerts: Vec<Alert>) -> Self {
        let mut store = Self::new();
        store.replace_all(alerts);
        store
    }

    pub fn unread_count(&self) -> usize {
        self.unread_count
    }

    /// Badge text: empty with nothing unread, `9+` past the cap
    pub fn badge_label(&self) -> String {
        match self.unread_count {
            0 => String::new(),
            n if n > BADGE_CAP => format!("{}+", BADGE_CAP),
            n => n.to_string(),
        }
    }

    pub fn alerts(&self) -> &[Alert] {
        self.alerts.list()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Set the read flag of one alert, returning the previous flag
    pub fn set_read(&mut self, id: &str, is_read: bool) -> Option<bool> {
        let mut alert = self.alerts.find(id)?.clone();
        let previous = alert.is_read;
        alert.is_read = is_read;
        self.upsert(alert);
        Some(previous)
    }

    /// Mark every alert read, returning the ids that were unread
    pub fn mark_all_read(&mut self) -> Vec<String> {
        let unread: Vec<Alert> = self.alerts.iter().filter(|a| !a.is_read).cloned().collect();
        let ids = unread.iter().map(|a| a.id().to_string()).collect();
        for mut alert in unread {
            alert.is_read = true;
            self.alerts.upsert(alert);
        }
        self.recount();
        ids
    }

    /// Flip the given alerts back to unread
    pub fn mark_unread(&mut self, ids: &[String]) {
        for id in ids {
            if let Some(alert) = self.alerts.find(id) {
                let mut alert = alert.clone();
                alert.is_read = false;
                self.alerts.upsert(alert);
            }
        }
        self.recount();
    }

    fn recount(&mut self) {
        self.unread_count = self.alerts.iter().filter(|a| !a.is_read).count();
    }
}

impl EntityCache<Alert> for NotificationStore {
    fn find(&self, id: &str) -> Option<&Alert> {
        self.alerts.find(id)
    }

    fn upsert(&mut self, entity: Alert) {
        self.alerts.upsert(entity);
        self.recount();
    }

    fn remove(&mut self, id: &str) -> Option<Alert> {
        let removed = self.alerts.remove(id);
        self.recount();
        removed
    }

    fn replace_all(&mut self, items: Vec<Alert>) {
        self.alerts.replace_all(items);
        self.recount();
    }
}
