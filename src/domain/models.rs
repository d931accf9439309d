//! Dashboard Records
//!
//! Data structures matching the server's JSON records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::entity::Entity;
use super::server_time;

macro_rules! impl_entity {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Entity for $ty {
                fn id(&self) -> &str {
                    &self.id
                }

                fn set_id(&mut self, id: String) {
                    self.id = id;
                }
            }
        )*
    };
}

impl_entity!(Account, Contract, Input, Reminder, Alert, Document, HealthScore);

// ========================
// Accounts
// ========================

/// Account type determines hierarchy role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    #[default]
    Standard,
    /// Enterprise license agreement parent
    ElaParent,
    ElaChild,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Standard => "standard",
            AccountType::ElaParent => "ela_parent",
            AccountType::ElaChild => "ela_child",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Enterprise,
    MidMarket,
    Smb,
    Startup,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Enterprise => "enterprise",
            Tier::MidMarket => "mid_market",
            Tier::Smb => "smb",
            Tier::Startup => "startup",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub account_type: AccountType,
    #[serde(default)]
    pub account_email: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub tier: Option<Tier>,
    #[serde(default)]
    pub owner_id: Option<String>,
    /// Parent account (None = top level)
    #[serde(default)]
    pub parent_account_id: Option<String>,
    #[serde(default = "default_check_in_days")]
    pub check_in_interval_days: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub children_count: Option<u32>,
    #[serde(default, with = "server_time::option")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            account_type: AccountType::default(),
            account_email: None,
            industry: None,
            tier: None,
            owner_id: None,
            parent_account_id: None,
            check_in_interval_days: default_check_in_days(),
            is_active: true,
            children_count: None,
            created_at: Some(Utc::now()),
        }
    }
}

fn default_check_in_days() -> i32 {
    30
}

fn default_true() -> bool {
    true
}

// ========================
// Contracts
// ========================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: String,
    pub account_id: String,
    pub contract_name: String,
    pub contract_type: String,
    /// active, expired, pending_renewal, draft
    pub status: String,
    pub effective_date: NaiveDate,
    /// Renewal date
    pub end_date: NaiveDate,
    #[serde(default)]
    pub term_length: Option<String>,
    #[serde(default)]
    pub auto_renewal: bool,
    #[serde(default)]
    pub notice_period_days: i32,
    #[serde(default)]
    pub total_contract_value: Option<f64>,
    #[serde(default)]
    pub arr: Option<f64>,
    #[serde(default)]
    pub primary_signer: Option<String>,
    /// Sent as `null` when never set
    #[serde(default, deserialize_with = "null_as_empty")]
    pub products_modules: Vec<String>,
    /// none, pending, active, expired
    #[serde(default = "default_ato_status")]
    pub ato_status: String,
    #[serde(default)]
    pub ato_expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub document_path: Option<String>,
    /// Server sends a plain date here
    pub created_at: NaiveDate,
}

impl Contract {
    pub fn new(
        id: impl Into<String>,
        account_id: impl Into<String>,
        contract_name: impl Into<String>,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            account_id: account_id.into(),
            contract_name: contract_name.into(),
            contract_type: "subscription".to_string(),
            status: "active".to_string(),
            effective_date: end_date,
            end_date,
            term_length: None,
            auto_renewal: false,
            notice_period_days: 0,
            total_contract_value: None,
            arr: None,
            primary_signer: None,
            products_modules: Vec::new(),
            ato_status: default_ato_status(),
            ato_expiry_date: None,
            document_path: None,
            created_at: Utc::now().date_naive(),
        }
    }
}

fn default_ato_status() -> String {
    "none".to_string()
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

// ========================
// Inputs
// ========================

/// Captured customer interaction (email, call, ticket, meeting note)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input {
    pub id: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub account_name: Option<String>,
    pub content: String,
    pub input_type: String,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub content_date: Option<String>,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub is_processed: bool,
    #[serde(default, with = "server_time::option")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Input {
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        input_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            account_id: None,
            account_name: None,
            content: content.into(),
            input_type: input_type.into(),
            sender: None,
            content_date: None,
            folder: None,
            is_processed: false,
            created_at: Some(Utc::now()),
        }
    }
}

// ========================
// Reminders
// ========================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub account_id: String,
    #[serde(default)]
    pub source_input_id: Option<String>,
    pub description: String,
    #[serde(default, with = "server_time::option")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(with = "server_time")]
    pub created_at: DateTime<Utc>,
}

impl Reminder {
    pub fn new(
        id: impl Into<String>,
        account_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            account_id: account_id.into(),
            source_input_id: None,
            description: description.into(),
            due_date: None,
            is_completed: false,
            created_at: Utc::now(),
        }
    }
}

// ========================
// Alerts
// ========================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    #[default]
    Info,
    Warning,
    Error,
    Success,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Info => "info",
            AlertKind::Warning => "warning",
            AlertKind::Error => "error",
            AlertKind::Success => "success",
        }
    }
}

/// Account-agnostic notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    /// In-app navigation target
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(with = "server_time")]
    pub created_at: DateTime<Utc>,
}

impl Alert {
    pub fn new(id: impl Into<String>, kind: AlertKind, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            message: String::new(),
            link: None,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}

// ========================
// Documents
// ========================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub account_id: String,
    pub name: String,
    /// Server storage path, opaque to the client
    pub file_path: String,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(with = "server_time")]
    pub created_at: DateTime<Utc>,
}

// ========================
// Health Scores
// ========================

/// Server-computed health snapshot (read-only on the client)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    pub id: String,
    pub account_id: String,
    pub overall_score: i32,
    pub overall_status: String,
    #[serde(with = "server_time")]
    pub calculated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_alert_decodes_naive_server_timestamp() {
        let json = r#"{
            "type": "warning",
            "title": "Renewal due",
            "message": "Acme renews in 30 days",
            "link": "/accounts/acc-1",
            "is_read": false,
            "id": "5b1f0c9e-3d1a-4c55-9a43-0d3f1e0f7a21",
            "created_at": "2026-03-01T09:00:00.123456"
        }"#;

        let alert: Alert = serde_json::from_str(json).unwrap();
        assert_eq!(alert.kind, AlertKind::Warning);
        assert_eq!(alert.link.as_deref(), Some("/accounts/acc-1"));
        assert_eq!(alert.created_at.hour(), 9);
        assert_eq!(alert.created_at.nanosecond(), 123_456_000);

        let value = serde_json::to_value(&alert).unwrap();
        assert_eq!(value["type"], "warning");
        let again: Alert = serde_json::from_value(value).unwrap();
        assert_eq!(again, alert);
    }

    #[test]
    fn test_account_defaults_when_fields_missing() {
        let account: Account = serde_json::from_str(r#"{"id": "acc-1", "name": "Acme"}"#).unwrap();
        assert_eq!(account.account_type, AccountType::Standard);
        assert_eq!(account.check_in_interval_days, 30);
        assert!(account.is_active);
        assert!(account.created_at.is_none());
    }

    #[test]
    fn test_contract_decodes_date_only_created_at() {
        let json = r#"{
            "contract_name": "Platform",
            "contract_type": "subscription",
            "status": "active",
            "effective_date": "2025-01-01",
            "end_date": "2026-01-01",
            "term_length": null,
            "auto_renewal": true,
            "notice_period_days": 30,
            "total_contract_value": 0,
            "arr": null,
            "primary_signer": null,
            "economic_buyer": null,
            "products_modules": null,
            "fedramp_required": false,
            "fisma_level": "none",
            "hipaa_required": false,
            "section_508_required": false,
            "ato_status": "none",
            "ato_expiry_date": null,
            "id": "c1",
            "account_id": "acc-1",
            "created_at": "2025-01-01",
            "updated_at": "2025-02-01"
        }"#;

        let contract: Contract = serde_json::from_str(json).unwrap();
        assert_eq!(contract.end_date, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(contract.created_at, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert!(contract.arr.is_none());
        assert_eq!(contract.total_contract_value, Some(0.0));
        assert!(contract.products_modules.is_empty());
    }

    #[test]
    fn test_reminder_and_health_score_decode_naive_timestamps() {
        let reminder: Reminder = serde_json::from_str(
            r#"{
                "description": "Prep QBR",
                "due_date": "2026-03-10T00:00:00",
                "is_completed": false,
                "id": "r1",
                "account_id": "acc-1",
                "source_input_id": null,
                "created_at": "2026-03-01T09:00:00.5"
            }"#,
        )
        .unwrap();
        assert_eq!(
            reminder.due_date,
            Some(Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap())
        );

        let no_due: Reminder = serde_json::from_str(
            r#"{"id": "r2", "account_id": "acc-1", "description": "x", "due_date": null,
                "created_at": "2026-03-01T09:00:00"}"#,
        )
        .unwrap();
        assert!(no_due.due_date.is_none());

        let score: HealthScore = serde_json::from_str(
            r#"{
                "id": "h1",
                "account_id": "acc-1",
                "overall_score": 72,
                "overall_status": "healthy",
                "sentiment_score": 70,
                "engagement_score": 75,
                "calculated_at": "2026-03-01T09:00:00.000001"
            }"#,
        )
        .unwrap();
        assert_eq!(score.overall_score, 72);
        assert_eq!(score.calculated_at.nanosecond(), 1_000);
    }

    #[test]
    fn test_unparseable_timestamp_is_rejected() {
        let result = serde_json::from_str::<Document>(
            r#"{"id": "d1", "account_id": "acc-1", "name": "msa.pdf",
                "file_path": "uploads/msa.pdf", "file_type": null, "created_at": "soon"}"#,
        );
        assert!(result.is_err());
    }
}
