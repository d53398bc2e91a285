//! Director dealing direction, unusual activity and summary sentiment.

use chrono::{Duration, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use jaibird_core::AnalyticsSettings;

use crate::aggregate::Tally;
use crate::categories::DEALINGS_BY_DIRECTORS;
use crate::types::*;

pub const MAX_RECENT_DEALINGS: usize = 5;
pub const MAX_ACTIVITY_ALERTS: usize = 10;
pub const MAX_COMPANY_SENTIMENTS: usize = 15;

/// Trailing window counted as "recent" for activity alerts.
pub const RECENT_WINDOW_DAYS: i64 = 7;

static BUY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)purchase|acquisition|bought|buy|acquire|exercise\s+of\s+options|settlement\s+of\s+shares|share\s+incentive|employee\s+share\s+plan",
    )
    .unwrap()
});

static SELL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)sold|dispos(?:al|ed)|selling").unwrap());

static SALE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)sale").unwrap());

static POSITIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:growth|increase|profit|gain|strong|positive|improvement|",
        r"exceed|outperform|upgrade|beat|record|successful|dividend|",
        r"expansion|milestone|optimistic|recovery|robust|surplus|",
        r"confident|opportunity|upside)\b",
    ))
    .unwrap()
});

static NEGATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:loss|decline|decrease|negative|warning|risk|concern|",
        r"impairment|writedown|write-down|downgrade|underperform|",
        r"deteriorat|weak|challenge|uncertainty|cautionary|default|",
        r"restructur|retrench|suspend|liquidat|fraud|irregular)\b",
    ))
    .unwrap()
});

fn mentions_sale(title: &str) -> bool {
    SALE.find_iter(title).any(|m| {
        let before = title[..m.start()].to_ascii_lowercase();
        !before.ends_with("ac") && !before.ends_with("dis")
    })
}

/// Direction of a dealing title. Both or neither direction is neutral.
pub fn dealing_direction(title: &str) -> DealingDirection {
    let buy = BUY.is_match(title);
    let sell = SELL.is_match(title) || mentions_sale(title);
    match (buy, sell) {
        (true, false) => DealingDirection::Buy,
        (false, true) => DealingDirection::Sell,
        _ => DealingDirection::Neutral,
    }
}

/// Net buy/sell signal across "Dealings by Directors" filings.
pub fn director_dealing_signal(items: &[CategorizedFiling]) -> DealingSignal {
    let mut buys = Vec::new();
    let mut sells = Vec::new();
    let mut neutral = 0usize;

    for item in items.iter().filter(|i| i.category == DEALINGS_BY_DIRECTORS) {
        let record = DealingRecord {
            company_name: item.company_name.clone(),
            title: item.title.clone(),
            date_published: item.date_published,
        };
        match dealing_direction(&item.title) {
            DealingDirection::Buy => buys.push(record),
            DealingDirection::Sell => sells.push(record),
            DealingDirection::Neutral => neutral += 1,
        }
    }

    let net = buys.len() as i64 - sells.len() as i64;
    let signal = match net {
        n if n > 0 => SignalLabel::NetBuying,
        n if n < 0 => SignalLabel::NetSelling,
        _ => SignalLabel::Neutral,
    };
    let (buy_count, sell_count) = (buys.len(), sells.len());

    for list in [&mut buys, &mut sells] {
        list.sort_by(|a, b| b.date_published.cmp(&a.date_published));
        list.truncate(MAX_RECENT_DEALINGS);
    }

    DealingSignal {
        signal,
        net,
        total_dealings: buy_count + sell_count + neutral,
        buys: buy_count,
        sells: sell_count,
        neutral,
        recent_buys: buys,
        recent_sells: sells,
    }
}

/// Companies filing unusually often in the last seven days.
///
/// The recent count is compared with the company's average weekly count
/// over the lookback window. A company is flagged when the recent count is
/// strictly above `average * threshold` and at least the configured
/// minimum.
pub fn unusual_activity(
    items: &[CategorizedFiling],
    now: NaiveDateTime,
    settings: &AnalyticsSettings,
) -> Vec<ActivityAlert> {
    let cutoff = now - Duration::days(settings.anomaly_lookback_days);
    let recent_cutoff = now - Duration::days(RECENT_WINDOW_DAYS);

    let mut window = Tally::default();
    let mut recent = Tally::default();
    for item in items {
        let Some(dt) = item.date_published else { continue };
        if dt < cutoff {
            continue;
        }
        window.add(&item.company_name);
        if dt >= recent_cutoff {
            recent.add(&item.company_name);
        }
    }

    let weeks = (settings.anomaly_lookback_days as f64 / RECENT_WINDOW_DAYS as f64).max(1.0);
    let mut alerts: Vec<ActivityAlert> = recent
        .most_common()
        .into_iter()
        .filter_map(|(company, recent_7d)| {
            let avg_weekly = window.get(&company) as f64 / weeks;
            let flagged = avg_weekly > 0.0
                && recent_7d as f64 > avg_weekly * settings.anomaly_threshold
                && recent_7d >= settings.anomaly_min_recent;
            flagged.then(|| ActivityAlert {
                company,
                recent_7d,
                avg_weekly: round_to(avg_weekly, 1),
                ratio: round_to(recent_7d as f64 / avg_weekly, 1),
            })
        })
        .collect();

    alerts.sort_by(|a, b| b.ratio.total_cmp(&a.ratio));
    alerts.truncate(MAX_ACTIVITY_ALERTS);
    alerts
}

/// Keyword sentiment of one summary in `[-1, 1]`; 0 with no lexicon hits.
pub fn score_summary(summary: &str) -> f64 {
    let pos = POSITIVE.find_iter(summary).count() as f64;
    let neg = NEGATIVE.find_iter(summary).count() as f64;
    if pos + neg == 0.0 {
        0.0
    } else {
        (pos - neg) / (pos + neg)
    }
}

/// Sentiment over every filing with a summary.
pub fn sentiment_summary(items: &[CategorizedFiling], threshold: f64) -> SentimentSummary {
    let mut scores = Vec::new();
    let mut per_company: Vec<(String, Vec<f64>)> = Vec::new();

    for item in items.iter().filter(|i| !i.ai_summary.trim().is_empty()) {
        let score = score_summary(&item.ai_summary);
        scores.push(score);
        match per_company.iter_mut().find(|(name, _)| *name == item.company_name) {
            Some((_, list)) => list.push(score),
            None => per_company.push((item.company_name.clone(), vec![score])),
        }
    }

    let overall = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };
    let positive = scores.iter().filter(|s| **s > threshold).count();
    let negative = scores.iter().filter(|s| **s < -threshold).count();

    let mut company_scores: Vec<CompanySentiment> = per_company
        .into_iter()
        .map(|(company, list)| {
            let avg = list.iter().sum::<f64>() / list.len() as f64;
            CompanySentiment {
                company,
                avg_sentiment: round_to(avg, 2),
                count: list.len(),
                label: SentimentLabel::for_score(avg, threshold),
            }
        })
        .collect();
    company_scores.sort_by(|a, b| b.avg_sentiment.total_cmp(&a.avg_sentiment));
    company_scores.truncate(MAX_COMPANY_SENTIMENTS);

    SentimentSummary {
        overall_score: round_to(overall, 2),
        overall_label: SentimentLabel::for_score(overall, threshold),
        positive,
        negative,
        neutral: scores.len() - positive - negative,
        total_analysed: scores.len(),
        company_scores,
    }
}
