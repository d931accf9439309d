//! View Pipeline
//!
//! Pure `(collection, ViewState) -> Vec<T>`: search, facet filters and a
//! stable sort. Nothing is cached; every call recomputes from its inputs, so
//! identical inputs give identical output.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::domain::{Account, Alert, Contract, Document, Input, Reminder};

/// Wildcard accepted by the filter dropdowns
pub const ALL: &str = "all";

/// Facet filter: everything, or one exact value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    Exactly(String),
}

impl Filter {
    /// `""` and `"all"` (any case) are the wildcard
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case(ALL) {
            Filter::All
        } else {
            Filter::Exactly(raw.to_string())
        }
    }

    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Filter::All => true,
            Filter::Exactly(expected) => value == Some(expected.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub key: String,
    pub direction: SortDirection,
}

/// What one screen is currently showing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub search_text: String,
    pub status_filter: Filter,
    pub type_filter: Filter,
    pub sort: Option<SortSpec>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status_filter = Filter::parse(status);
        self
    }

    pub fn with_type(mut self, kind: &str) -> Self {
        self.type_filter = Filter::parse(kind);
        self
    }

    pub fn sorted_by(mut self, key: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some(SortSpec {
            key: key.into(),
            direction,
        });
        self
    }

    /// Column header click: same key flips direction, a new key sorts ascending
    pub fn toggle_sort(&mut self, key: &str) {
        self.sort = match self.sort.take() {
            Some(spec) if spec.key == key => Some(SortSpec {
                direction: spec.direction.toggled(),
                ..spec
            }),
            _ => Some(SortSpec {
                key: key.to_string(),
                direction: SortDirection::Ascending,
            }),
        };
    }
}

/// Value a record exposes for one sort key
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Number(f64),
    Text(String),
    /// Unknown key or absent text
    Missing,
}

impl SortValue {
    /// Absent numbers sort as zero
    pub fn number(value: Option<f64>) -> Self {
        SortValue::Number(value.unwrap_or(0.0))
    }

    pub fn text(value: Option<&str>) -> Self {
        value.map_or(SortValue::Missing, |v| SortValue::Text(v.to_string()))
    }

    pub fn timestamp(value: Option<&DateTime<Utc>>) -> Self {
        value.map_or(SortValue::Missing, |v| {
            SortValue::Text(v.to_rfc3339_opts(SecondsFormat::Micros, true))
        })
    }

    pub fn date(value: &NaiveDate) -> Self {
        SortValue::Text(value.format("%Y-%m-%d").to_string())
    }

    fn compare(&self, other: &SortValue) -> Ordering {
        use SortValue::*;
        match (self, other) {
            (Number(a), Number(b)) => a.total_cmp(b),
            (Number(a), Missing) => a.total_cmp(&0.0),
            (Missing, Number(b)) => 0.0f64.total_cmp(b),
            (Text(a), Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (Text(a), Missing) => {
                if a.is_empty() {
                    Ordering::Equal
                } else {
                    Ordering::Greater
                }
            }
            (Missing, Text(b)) => {
                if b.is_empty() {
                    Ordering::Equal
                } else {
                    Ordering::Less
                }
            }
            (Missing, Missing) => Ordering::Equal,
            (Number(_), Text(_)) => Ordering::Less,
            (Text(_), Number(_)) => Ordering::Greater,
        }
    }
}

/// Record the view pipeline can search, filter and sort
pub trait Viewable {
    /// Fields the free-text search looks in
    fn search_fields(&self) -> Vec<&str>;

    fn status(&self) -> Option<&str> {
        None
    }

    fn kind(&self) -> Option<&str> {
        None
    }

    fn sort_value(&self, key: &str) -> SortValue;
}

fn matches_search<T: Viewable>(item: &T, needle: &str) -> bool {
    needle.is_empty()
        || item
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
}

/// Filter and sort `items` for display
pub fn apply_view<T: Viewable + Clone>(items: &[T], state: &ViewState) -> Vec<T> {
    let needle = state.search_text.trim().to_lowercase();
    let mut visible: Vec<T> = items
        .iter()
        .filter(|item| matches_search(*item, &needle))
        .filter(|item| state.status_filter.matches(item.status()))
        .filter(|item| state.type_filter.matches(item.kind()))
        .cloned()
        .collect();

    if let Some(spec) = &state.sort {
        // sort_by is stable: ties keep their input order in both directions
        visible.sort_by(|a, b| {
            let ordering = a.sort_value(&spec.key).compare(&b.sort_value(&spec.key));
            match spec.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
    }
    visible
}

/// Folder sidebar of the inputs screen: `"All"` first, then each folder
/// in first-seen order, with its count
pub fn input_folders(inputs: &[Input]) -> Vec<(String, usize)> {
    let mut folders: Vec<(String, usize)> = vec![("All".to_string(), inputs.len())];
    for folder in inputs.iter().filter_map(|i| i.folder.as_deref()).filter(|f| !f.is_empty()) {
        match folders.iter_mut().skip(1).find(|(name, _)| name == folder) {
            Some((_, count)) => *count += 1,
            None => folders.push((folder.to_string(), 1)),
        }
    }
    folders
}

/// Inputs in `folder`; `"All"` keeps everything
pub fn inputs_in_folder(inputs: &[Input], folder: &str) -> Vec<Input> {
    inputs
        .iter()
        .filter(|i| folder == "All" || i.folder.as_deref() == Some(folder))
        .cloned()
        .collect()
}

impl Viewable for Account {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.industry.as_deref());
        fields.extend(self.account_email.as_deref());
        fields
    }

    fn status(&self) -> Option<&str> {
        Some(if self.is_active { "active" } else { "inactive" })
    }

    fn kind(&self) -> Option<&str> {
        Some(self.account_type.as_str())
    }

    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "name" => SortValue::text(Some(&self.name)),
            "tier" => SortValue::text(self.tier.map(|t| t.as_str())),
            "industry" => SortValue::text(self.industry.as_deref()),
            "check_in_interval_days" => SortValue::Number(self.check_in_interval_days as f64),
            "created_at" => SortValue::timestamp(self.created_at.as_ref()),
            _ => SortValue::Missing,
        }
    }
}

impl Viewable for Contract {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.contract_name.as_str(), self.contract_type.as_str()];
        fields.extend(self.primary_signer.as_deref());
        fields
    }

    fn status(&self) -> Option<&str> {
        Some(&self.status)
    }

    fn kind(&self) -> Option<&str> {
        Some(&self.contract_type)
    }

    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "contract_name" => SortValue::text(Some(&self.contract_name)),
            "status" => SortValue::text(Some(&self.status)),
            "arr" => SortValue::number(self.arr),
            "total_contract_value" => SortValue::number(self.total_contract_value),
            "notice_period_days" => SortValue::Number(self.notice_period_days as f64),
            "end_date" => SortValue::date(&self.end_date),
            "created_at" => SortValue::date(&self.created_at),
            _ => SortValue::Missing,
        }
    }
}

impl Viewable for Input {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.content.as_str()];
        fields.extend(self.account_name.as_deref());
        fields.extend(self.sender.as_deref());
        fields
    }

    fn status(&self) -> Option<&str> {
        Some(if self.is_processed { "processed" } else { "pending" })
    }

    fn kind(&self) -> Option<&str> {
        Some(&self.input_type)
    }

    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "created_at" => SortValue::timestamp(self.created_at.as_ref()),
            "content_date" => SortValue::text(self.content_date.as_deref()),
            "input_type" => SortValue::text(Some(&self.input_type)),
            _ => SortValue::Missing,
        }
    }
}

impl Viewable for Reminder {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.description.as_str()]
    }

    fn status(&self) -> Option<&str> {
        Some(if self.is_completed { "completed" } else { "open" })
    }

    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "description" => SortValue::text(Some(&self.description)),
            "due_date" => SortValue::timestamp(self.due_date.as_ref()),
            "created_at" => SortValue::timestamp(Some(&self.created_at)),
            _ => SortValue::Missing,
        }
    }
}

impl Viewable for Alert {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.message.as_str()]
    }

    fn status(&self) -> Option<&str> {
        Some(if self.is_read { "read" } else { "unread" })
    }

    fn kind(&self) -> Option<&str> {
        Some(self.kind.as_str())
    }

    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "title" => SortValue::text(Some(&self.title)),
            "created_at" => SortValue::timestamp(Some(&self.created_at)),
            _ => SortValue::Missing,
        }
    }
}

impl Viewable for Document {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.file_type.as_deref());
        fields
    }

    fn kind(&self) -> Option<&str> {
        self.file_type.as_deref()
    }

    fn sort_value(&self, key: &str) -> SortValue {
        match key {
            "name" => SortValue::text(Some(&self.name)),
            "created_at" => SortValue::timestamp(Some(&self.created_at)),
            _ => SortValue::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn contract(id: &str, status: &str, arr: Option<f64>) -> Contract {
        let end = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        let mut contract = Contract::new(id, "acc-1", format!("Contract {}", id), end);
        contract.status = status.to_string();
        contract.arr = arr;
        contract
    }

    fn ids(items: &[Contract]) -> Vec<&str> {
        items.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_status_filter_and_arr_sort() {
        let contracts = vec![
            contract("1", "active", Some(1000.0)),
            contract("2", "expired", Some(500.0)),
        ];

        let active = apply_view(&contracts, &ViewState::new().with_status("active"));
        assert_eq!(ids(&active), vec!["1"]);

        let by_arr = apply_view(
            &contracts,
            &ViewState::new().sorted_by("arr", SortDirection::Descending),
        );
        assert_eq!(ids(&by_arr), vec!["1", "2"]);
    }

    #[test]
    fn test_all_is_wildcard() {
        assert_eq!(Filter::parse("All"), Filter::All);
        assert_eq!(Filter::parse(""), Filter::All);
        assert_eq!(Filter::parse("active"), Filter::Exactly("active".into()));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let mut acme = Account::new("a1", "Acme Corp");
        acme.industry = Some("Aerospace".into());
        let globex = Account::new("a2", "Globex");

        let found = apply_view(&[acme, globex], &ViewState::new().with_search("  AERO "));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "a1");
    }

    #[test]
    fn test_stable_sort_keeps_ties_in_input_order() {
        let contracts = vec![
            contract("a", "active", Some(300.0)),
            contract("b", "active", Some(100.0)),
            contract("c", "active", Some(300.0)),
            contract("d", "active", Some(200.0)),
            contract("e", "active", Some(100.0)),
        ];

        let asc = apply_view(
            &contracts,
            &ViewState::new().sorted_by("arr", SortDirection::Ascending),
        );
        assert_eq!(ids(&asc), vec!["b", "e", "d", "a", "c"]);

        let desc = apply_view(
            &contracts,
            &ViewState::new().sorted_by("arr", SortDirection::Descending),
        );
        assert_eq!(ids(&desc), vec!["a", "c", "d", "b", "e"]);
    }

    #[test]
    fn test_missing_numbers_sort_as_zero() {
        let contracts = vec![
            contract("pos", "active", Some(10.0)),
            contract("none", "active", None),
            contract("neg", "active", Some(-5.0)),
        ];

        let asc = apply_view(
            &contracts,
            &ViewState::new().sorted_by("arr", SortDirection::Ascending),
        );
        assert_eq!(ids(&asc), vec!["neg", "none", "pos"]);
    }

    #[test]
    fn test_toggle_sort() {
        let mut state = ViewState::new();
        state.toggle_sort("arr");
        assert_eq!(state.sort.as_ref().unwrap().direction, SortDirection::Ascending);
        state.toggle_sort("arr");
        assert_eq!(state.sort.as_ref().unwrap().direction, SortDirection::Descending);
        state.toggle_sort("end_date");
        assert_eq!(
            state.sort,
            Some(SortSpec {
                key: "end_date".into(),
                direction: SortDirection::Ascending
            })
        );
    }

    #[test]
    fn test_unknown_sort_key_keeps_order() {
        let contracts = vec![contract("x", "active", None), contract("y", "active", None)];
        let view = apply_view(
            &contracts,
            &ViewState::new().sorted_by("nope", SortDirection::Descending),
        );
        assert_eq!(ids(&view), vec!["x", "y"]);
    }

    #[test]
    fn test_input_folders() {
        let mut inputs: Vec<Input> = (0..4)
            .map(|i| Input::new(format!("i{}", i), "note", "email"))
            .collect();
        inputs[0].folder = Some("Renewals".into());
        inputs[1].folder = Some("Escalations".into());
        inputs[2].folder = Some("Renewals".into());

        assert_eq!(
            input_folders(&inputs),
            vec![
                ("All".to_string(), 4),
                ("Renewals".to_string(), 2),
                ("Escalations".to_string(), 1)
            ]
        );
        assert_eq!(inputs_in_folder(&inputs, "Renewals").len(), 2);
        assert_eq!(inputs_in_folder(&inputs, "All").len(), 4);
    }
}
