//! Every aggregation over one set of filings, in one serializable value.

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use jaibird_core::AnalyticsSettings;

use crate::aggregate::*;
use crate::categories::{all_categories, Category};
use crate::sectors::sector_breakdown;
use crate::signals::{director_dealing_signal, sentiment_summary, unusual_activity};
use crate::types::*;

pub const TOP_COMPANIES: usize = 10;
pub const HEATMAP_COMPANIES: usize = 10;
pub const HIGHLIGHTS: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub generated_at: NaiveDateTime,
    pub categories: Vec<Category>,
    pub noise: NoiseSummary,
    pub urgency: UrgencyBreakdown,
    pub top_companies: Vec<CompanyCount>,
    pub category_breakdown: Vec<CategoryCount>,
    pub sector_breakdown: Vec<SectorCount>,
    pub daily_volume: Vec<VolumePoint>,
    pub weekly_volume: Vec<VolumePoint>,
    pub highlights: Vec<CategorizedFiling>,
    pub today_strategic: Vec<CategorizedFiling>,
    pub heatmap: Heatmap,
    pub director_dealings: DealingSignal,
    pub unusual_activity: Vec<ActivityAlert>,
    pub sentiment: SentimentSummary,
    pub upcoming_events: Vec<UpcomingEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watchlist: Option<WatchlistPulse>,
}

impl AnalyticsReport {
    pub fn build(
        items: &[CategorizedFiling],
        now: NaiveDateTime,
        settings: &AnalyticsSettings,
        watchlist: &[String],
    ) -> Self {
        debug!("Building analytics report over {} filings", items.len());
        Self {
            generated_at: now,
            categories: all_categories(),
            noise: noise_summary(items),
            urgency: urgency_breakdown(items),
            top_companies: top_companies(items, TOP_COMPANIES, false),
            category_breakdown: category_breakdown(items, true),
            sector_breakdown: sector_breakdown(items, true),
            daily_volume: volume_over_time(items, VolumeBucket::Day, false),
            weekly_volume: volume_over_time(items, VolumeBucket::Week, false),
            highlights: recent_strategic_highlights(items, HIGHLIGHTS),
            today_strategic: today_strategic(items, now.date()),
            heatmap: activity_heatmap(items, HEATMAP_COMPANIES),
            director_dealings: director_dealing_signal(items),
            unusual_activity: unusual_activity(items, now, settings),
            sentiment: sentiment_summary(items, settings.sentiment_threshold),
            upcoming_events: upcoming_events(items),
            watchlist: (!watchlist.is_empty()).then(|| watchlist_pulse(items, watchlist)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, filing};

    #[test]
    fn test_report_serializes() {
        let items = vec![
            filing("Acme Ltd", "Trading statement", Some("2025-03-20 09:00:00")),
            filing("Beta Ltd", "Notification of interest payment", Some("2025-03-19 09:00:00")),
        ];
        let report = AnalyticsReport::build(
            &items,
            at("2025-03-20 12:00:00"),
            &AnalyticsSettings::default(),
            &[],
        );
        assert_eq!(report.today_strategic.len(), 1);
        assert_eq!(report.noise.noise, 1);
        assert!(report.watchlist.is_none());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["director_dealings"]["signal"], "Neutral");
        assert_eq!(json["upcoming_events"][0]["event_type"], "Trading Statement");
        assert!(json.get("watchlist").is_none());
    }
}
