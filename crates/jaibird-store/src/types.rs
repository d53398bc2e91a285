//! Row types for the company intelligence store.

use serde::{Deserialize, Serialize};

/// Accumulated intelligence about one issuer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub id: i64,
    pub name: String,
    /// Exchange ticker, upper-case, at most 5 characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jse_code: Option<String>,
    pub website: String,
    /// Current sponsor (the most recent sponsor history entry).
    pub sponsor: String,
    pub description: String,
    pub sector: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    pub is_active: bool,
}

/// A director record in a company's ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Director {
    pub id: i64,
    pub company_id: i64,
    pub name: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointed_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resigned_date: Option<String>,
    /// Filing the record was last touched by.
    pub source_sens: String,
    pub is_active: bool,
}

/// One append-only sponsor change event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SponsorChange {
    pub id: i64,
    pub company_id: i64,
    pub sponsor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
    pub source: String,
}

/// A filing linked to a company's activity feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyFiling {
    pub id: i64,
    pub company_id: i64,
    pub sens_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_published: Option<String>,
    pub title: String,
}

/// Listing row with ledger counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanySummary {
    #[serde(flatten)]
    pub profile: CompanyProfile,
    pub director_count: i64,
    pub sens_count: i64,
}

/// Full profile with its related ledgers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub profile: CompanyProfile,
    pub directors: Vec<Director>,
    pub sponsor_history: Vec<SponsorChange>,
    pub recent_sens: Vec<CompanyFiling>,
}

/// What a resignation did to the director ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResignOutcome {
    /// An active record was marked inactive.
    MarkedInactive,
    /// No record existed; an inactive one was recorded.
    RecordedNew,
    /// Only resigned records exist for the name; nothing changed.
    AlreadyResigned,
}

/// Result of assigning a ticker to a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickerUpdate {
    Set,
    /// Already set, or not a valid ticker.
    Unchanged,
    /// Another company holds the ticker.
    OwnedBy(i64),
}
