//! JAIBird Analytics — title categorization and aggregations.
//!
//! Everything here is a pure function of its inputs; "now" is always
//! passed in.

pub mod aggregate;
pub mod categories;
pub mod report;
pub mod sectors;
pub mod signals;
pub mod types;

pub use aggregate::{
    activity_heatmap, category_breakdown, noise_summary, recent_strategic_highlights,
    today_strategic, top_companies, upcoming_events, urgency_breakdown, volume_over_time,
    watchlist_pulse,
};
pub use categories::{
    all_categories, categorize_announcements, categorize_title, Category, UNCATEGORISED,
};
pub use report::AnalyticsReport;
pub use sectors::{classify_sector, sector_breakdown};
pub use signals::{
    dealing_direction, director_dealing_signal, score_summary, sentiment_summary,
    unusual_activity,
};
pub use types::*;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDateTime;

    use crate::categories::categorize_title;
    use crate::types::CategorizedFiling;

    pub fn at(ts: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    pub fn filing(company: &str, title: &str, published: Option<&str>) -> CategorizedFiling {
        let category = categorize_title(title);
        CategorizedFiling {
            sens_number: format!("S{}", company.len() + title.len()),
            company_name: company.to_string(),
            title: title.to_string(),
            date_published: published.map(at),
            is_urgent: false,
            category: category.label,
            is_noise: category.is_noise,
            ai_summary: String::new(),
            pdf_url: String::new(),
        }
    }
}
