//! Records and aggregate shapes.

use chrono::NaiveDateTime;
use serde::Serialize;

/// An announcement reduced to what the aggregations need, with its category.
#[derive(Debug, Clone, Serialize)]
pub struct CategorizedFiling {
    pub sens_number: String,
    pub company_name: String,
    pub title: String,
    pub date_published: Option<NaiveDateTime>,
    pub is_urgent: bool,
    pub category: &'static str,
    pub is_noise: bool,
    pub ai_summary: String,
    pub pdf_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyCount {
    pub company: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectorCount {
    pub sector: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoiseSummary {
    pub total: usize,
    pub strategic: usize,
    pub noise: usize,
    /// Noise share in percent, one decimal.
    pub noise_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UrgencyBreakdown {
    pub urgent: usize,
    pub normal: usize,
}

/// Time bucket for volume series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeBucket {
    Day,
    /// Keyed by the Monday starting the week.
    Week,
    Month,
}

impl VolumeBucket {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumePoint {
    pub date: String,
    pub count: usize,
}

/// Company x strategic-category counts for the busiest companies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Heatmap {
    pub companies: Vec<String>,
    pub categories: Vec<String>,
    /// One row per company, one column per category.
    pub matrix: Vec<Vec<usize>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DealingDirection {
    Buy,
    Sell,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignalLabel {
    #[serde(rename = "Net Buying")]
    NetBuying,
    #[serde(rename = "Net Selling")]
    NetSelling,
    Neutral,
}

#[derive(Debug, Clone, Serialize)]
pub struct DealingRecord {
    pub company_name: String,
    pub title: String,
    pub date_published: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DealingSignal {
    pub signal: SignalLabel,
    pub net: i64,
    pub total_dealings: usize,
    pub buys: usize,
    pub sells: usize,
    pub neutral: usize,
    pub recent_buys: Vec<DealingRecord>,
    pub recent_sells: Vec<DealingRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityAlert {
    pub company: String,
    pub recent_7d: usize,
    pub avg_weekly: f64,
    pub ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Positive above `+threshold`, Negative below `-threshold`.
    pub fn for_score(score: f64, threshold: f64) -> Self {
        if score > threshold {
            Self::Positive
        } else if score < -threshold {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanySentiment {
    pub company: String,
    pub avg_sentiment: f64,
    pub count: usize,
    pub label: SentimentLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentSummary {
    pub overall_score: f64,
    pub overall_label: SentimentLabel,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub total_analysed: usize,
    pub company_scores: Vec<CompanySentiment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchlistCompany {
    pub company: String,
    pub total: usize,
    pub strategic: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WatchlistPulse {
    pub watchlist_count: usize,
    pub market_count: usize,
    pub watchlist_strategic: usize,
    pub market_strategic: usize,
    pub watchlist_pct: f64,
    pub watchlist_companies: Vec<WatchlistCompany>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpcomingEvent {
    pub company: String,
    pub event_type: &'static str,
    pub title: String,
    pub date: Option<NaiveDateTime>,
    pub sens_number: String,
    pub pdf_url: String,
    pub ai_summary: String,
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
