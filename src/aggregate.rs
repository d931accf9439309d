//! Portfolio Aggregates
//!
//! Headline numbers for the dashboard home screen, derived from account,
//! health score and contract snapshots. Pure functions: "now" is captured
//! once by the caller-facing entry point and threaded through.

use std::collections::HashMap;

use chrono::{Days, NaiveDate, Utc};
use serde::Serialize;

use crate::domain::{Account, Contract, HealthScore, Tier};

pub const HEALTHY_THRESHOLD: i32 = 70;
pub const WARNING_THRESHOLD: i32 = 40;
/// Rows shown in the renewal and risk panels
pub const PANEL_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Warning,
    AtRisk,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Warning => "warning",
            HealthStatus::AtRisk => "at_risk",
        }
    }

    pub fn tone(&self) -> BadgeTone {
        match self {
            HealthStatus::Healthy => BadgeTone::Green,
            HealthStatus::Warning => BadgeTone::Yellow,
            HealthStatus::AtRisk => BadgeTone::Red,
        }
    }
}

/// Score badge colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTone {
    Green,
    Yellow,
    Red,
}

/// Bucket a score: `>= 70` healthy, `>= 40` warning, below that at risk
pub fn health_bucket(score: i32) -> HealthStatus {
    if score >= HEALTHY_THRESHOLD {
        HealthStatus::Healthy
    } else if score >= WARNING_THRESHOLD {
        HealthStatus::Warning
    } else {
        HealthStatus::AtRisk
    }
}

pub fn badge_tone(score: i32) -> BadgeTone {
    health_bucket(score).tone()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HealthDistribution {
    pub healthy: usize,
    pub warning: usize,
    pub at_risk: usize,
}

impl HealthDistribution {
    fn record(&mut self, status: HealthStatus) {
        match status {
            HealthStatus::Healthy => self.healthy += 1,
            HealthStatus::Warning => self.warning += 1,
            HealthStatus::AtRisk => self.at_risk += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.healthy + self.warning + self.at_risk
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpcomingRenewal {
    pub contract_id: String,
    pub contract_name: String,
    /// `None` when the owning account is not in the snapshot
    pub account_name: Option<String>,
    pub end_date: NaiveDate,
    pub arr: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    /// Active accounts, scored or not
    pub total_accounts: usize,
    /// Mean latest score over scored accounts; `None` when none are scored
    pub average_score: Option<f64>,
    pub distribution: HealthDistribution,
    /// Soonest renewals in the window, at most [`PANEL_LIMIT`]
    pub upcoming_renewals: Vec<UpcomingRenewal>,
    /// ARR renewing in the window, over every matching contract
    pub arr_in_window: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskyAccount {
    pub account_id: String,
    pub name: String,
    pub tier: Option<Tier>,
    pub score: i32,
    pub status: HealthStatus,
}

/// Newest score per account id
fn latest_scores(scores: &[HealthScore]) -> HashMap<&str, &HealthScore> {
    let mut latest: HashMap<&str, &HealthScore> = HashMap::new();
    for score in scores {
        latest
            .entry(score.account_id.as_str())
            .and_modify(|current| {
                if score.calculated_at > current.calculated_at {
                    *current = score;
                }
            })
            .or_insert(score);
    }
    latest
}

/// Summary as of the current UTC date
pub fn summarize(
    accounts: &[Account],
    scores: &[HealthScore],
    contracts: &[Contract],
    window_days: i64,
) -> PortfolioSummary {
    summarize_at(accounts, scores, contracts, Utc::now().date_naive(), window_days)
}

/// Summary as of `today`; the renewal window is `[today, today + window_days]`
///
/// A negative window lists nothing. A window reaching past the last
/// representable date is clamped to it.
pub fn summarize_at(
    accounts: &[Account],
    scores: &[HealthScore],
    contracts: &[Contract],
    today: NaiveDate,
    window_days: i64,
) -> PortfolioSummary {
    let latest = latest_scores(scores);
    let active: Vec<&Account> = accounts.iter().filter(|a| a.is_active).collect();

    let mut distribution = HealthDistribution::default();
    let mut score_sum = 0i64;
    for account in &active {
        if let Some(score) = latest.get(account.id.as_str()) {
            distribution.record(health_bucket(score.overall_score));
            score_sum += i64::from(score.overall_score);
        }
    }
    let scored = distribution.total();
    let average_score = (scored > 0).then(|| score_sum as f64 / scored as f64);

    let window_end = u64::try_from(window_days)
        .ok()
        .map(|days| today.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX));
    let mut renewing: Vec<&Contract> = contracts
        .iter()
        .filter(|c| c.status == "active" && c.end_date >= today)
        .filter(|c| window_end.is_some_and(|end| c.end_date <= end))
        .collect();
    renewing.sort_by_key(|c| c.end_date);

    let arr_in_window: f64 = renewing.iter().filter_map(|c| c.arr).sum();
    let upcoming_renewals = renewing
        .iter()
        .take(PANEL_LIMIT)
        .map(|c| UpcomingRenewal {
            contract_id: c.id.clone(),
            contract_name: c.contract_name.clone(),
            account_name: accounts
                .iter()
                .find(|a| a.id == c.account_id)
                .map(|a| a.name.clone()),
            end_date: c.end_date,
            arr: c.arr,
        })
        .collect();

    PortfolioSummary {
        total_accounts: active.len(),
        average_score,
        distribution,
        upcoming_renewals,
        arr_in_window,
    }
}

/// Active accounts whose latest score is below healthy, lowest first
pub fn risky_accounts(accounts: &[Account], scores: &[HealthScore]) -> Vec<RiskyAccount> {
    let latest = latest_scores(scores);
    let mut risky: Vec<RiskyAccount> = accounts
        .iter()
        .filter(|a| a.is_active)
        .filter_map(|account| {
            let score = latest.get(account.id.as_str())?;
            (score.overall_score < HEALTHY_THRESHOLD).then(|| RiskyAccount {
                account_id: account.id.clone(),
                name: account.name.clone(),
                tier: account.tier,
                score: score.overall_score,
                status: health_bucket(score.overall_score),
            })
        })
        .collect();
    risky.sort_by_key(|r| r.score);
    risky.truncate(PANEL_LIMIT);
    risky
}
