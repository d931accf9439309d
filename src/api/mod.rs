//! Remote Layer
//!
//! Traits the sync components depend on, and their HTTP implementation
//! against the dashboard API.

mod alerts;
mod client;
mod documents;
mod family;
mod scoped;
mod traits;

pub use client::{map_status, map_transport_error, ApiClient};
pub use documents::content_type_for;
pub use family::{HttpRepository, RemoteEntity};
pub use scoped::HealthApi;
pub use traits::{AlertsApi, Fetcher, RemoteRepository};
