//! Domain Layer - Core Entity Trait
//!
//! Every synchronized record has an opaque string identity assigned by the
//! server. Creates made before the server answers carry a placeholder id.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix of client-generated ids that the server has not confirmed yet
pub const PLACEHOLDER_PREFIX: &str = "tmp-";

/// Core trait for all synchronized entities
pub trait Entity: Clone + 'static {
    /// Returns the entity's unique identifier
    fn id(&self) -> &str;

    /// Replaces the identifier (used for placeholder and server-assigned ids)
    fn set_id(&mut self, id: String);

    /// Whether the entity still carries a client-generated id
    fn has_placeholder_id(&self) -> bool {
        is_placeholder_id(self.id())
    }
}

/// Generate a fresh placeholder id for an optimistic create
pub fn placeholder_id() -> String {
    format!("{}{}", PLACEHOLDER_PREFIX, uuid::Uuid::new_v4())
}

pub fn is_placeholder_id(id: &str) -> bool {
    id.starts_with(PLACEHOLDER_PREFIX)
}

/// Common result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Failures surfaced by fetches and mutations
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SyncError {
    /// Transport or connectivity failure
    #[error("Network failure: {0}")]
    NetworkFailure(String),
    #[error("Not found: {0}")]
    NotFound(String),
    /// Another mutation on the same id is still pending
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Payload rejected by the server
    #[error("Validation failure: {0}")]
    ValidationFailure(String),
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl SyncError {
    /// Failures worth retrying without user involvement
    pub fn is_transient(&self) -> bool {
        matches!(self, SyncError::NetworkFailure(_))
    }
}
