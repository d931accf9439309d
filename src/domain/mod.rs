//! Domain Layer
//!
//! Entity identity, the sync error taxonomy, the dashboard records and the
//! server's timestamp formats.

mod entity;
mod hierarchy;
mod models;
mod server_time;

pub use entity::{
    is_placeholder_id, placeholder_id, Entity, SyncError, SyncResult, PLACEHOLDER_PREFIX,
};
pub use hierarchy::{ancestor_chain, children_of, flatten_accounts};
pub use models::{
    Account, AccountType, Alert, AlertKind, Contract, Document, HealthScore, Input, Reminder, Tier,
};
