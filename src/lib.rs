//! Dashboard Sync
//!
//! Client-side state synchronization for the account health dashboard:
//! entity caches, optimistic writes with rollback, alert polling, and the
//! derived views screens render from.
//!
//! Everything runs on one logical thread. Shared state lives behind
//! `Rc<RefCell<_>>` handles and background work is spawned with
//! `spawn_local`, so the crate is driven from a `tokio::task::LocalSet`.

pub mod aggregate;
pub mod api;
pub mod collection;
pub mod config;
pub mod context;
pub mod domain;
pub mod mutation;
pub mod notifications;
pub mod poller;
pub mod store;
pub mod view;

pub use aggregate::{
    badge_tone, health_bucket, risky_accounts, summarize, summarize_at, BadgeTone, HealthStatus,
    PortfolioSummary,
};
pub use collection::Collection;
pub use config::ClientConfig;
pub use context::DashboardSession;
pub use domain::{Entity, SyncError, SyncResult};
pub use mutation::{Mutation, OptimisticMutator, PendingMutation};
pub use notifications::NotificationStore;
pub use poller::{Poller, DEFAULT_POLL_INTERVAL};
pub use store::{EntityCache, EntityStore, StoreHandle};
pub use view::{apply_view, Filter, SortDirection, ViewState, Viewable};
