//! Counting and bucketing helpers over categorized filings.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::*;

/// Counter that keeps first-seen order for equal counts.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl Tally {
    pub(crate) fn add(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].1 += 1,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), 1));
            }
        }
    }

    pub(crate) fn get(&self, key: &str) -> usize {
        self.index.get(key).map(|&i| self.entries[i].1).unwrap_or(0)
    }

    /// Entries by count, highest first.
    pub(crate) fn most_common(mut self) -> Vec<(String, usize)> {
        self.entries.sort_by(|a, b| b.1.cmp(&a.1));
        self.entries
    }
}

fn newest_first<T>(items: &mut [T], date: impl Fn(&T) -> Option<chrono::NaiveDateTime>) {
    items.sort_by(|a, b| date(b).cmp(&date(a)));
}

pub(crate) fn sort_newest_first(items: &mut [CategorizedFiling]) {
    newest_first(items, |i| i.date_published);
}

pub fn top_companies(items: &[CategorizedFiling], n: usize, exclude_noise: bool) -> Vec<CompanyCount> {
    let mut tally = Tally::default();
    for item in items.iter().filter(|i| !(exclude_noise && i.is_noise)) {
        tally.add(&item.company_name);
    }
    tally
        .most_common()
        .into_iter()
        .take(n)
        .map(|(company, count)| CompanyCount { company, count })
        .collect()
}

pub fn category_breakdown(items: &[CategorizedFiling], exclude_noise: bool) -> Vec<CategoryCount> {
    let mut tally = Tally::default();
    for item in items.iter().filter(|i| !(exclude_noise && i.is_noise)) {
        tally.add(item.category);
    }
    tally
        .most_common()
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect()
}

pub fn noise_summary(items: &[CategorizedFiling]) -> NoiseSummary {
    let total = items.len();
    let noise = items.iter().filter(|i| i.is_noise).count();
    let noise_pct = if total == 0 {
        0.0
    } else {
        round_to(noise as f64 / total as f64 * 100.0, 1)
    };
    NoiseSummary {
        total,
        strategic: total - noise,
        noise,
        noise_pct,
    }
}

fn bucket_key(date: NaiveDate, bucket: VolumeBucket) -> String {
    match bucket {
        VolumeBucket::Day => date.format("%Y-%m-%d").to_string(),
        VolumeBucket::Week => {
            let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
            monday.format("%Y-%m-%d").to_string()
        }
        VolumeBucket::Month => date.format("%Y-%m").to_string(),
    }
}

/// Filing counts per bucket, oldest first. Undated filings are skipped.
pub fn volume_over_time(
    items: &[CategorizedFiling],
    bucket: VolumeBucket,
    exclude_noise: bool,
) -> Vec<VolumePoint> {
    let mut buckets: BTreeMap<String, usize> = BTreeMap::new();
    for item in items.iter().filter(|i| !(exclude_noise && i.is_noise)) {
        if let Some(dt) = item.date_published {
            *buckets.entry(bucket_key(dt.date(), bucket)).or_default() += 1;
        }
    }
    buckets
        .into_iter()
        .map(|(date, count)| VolumePoint { date, count })
        .collect()
}

pub fn urgency_breakdown(items: &[CategorizedFiling]) -> UrgencyBreakdown {
    let urgent = items.iter().filter(|i| i.is_urgent).count();
    UrgencyBreakdown {
        urgent,
        normal: items.len() - urgent,
    }
}

/// Newest strategic filings.
pub fn recent_strategic_highlights(items: &[CategorizedFiling], n: usize) -> Vec<CategorizedFiling> {
    let mut strategic: Vec<CategorizedFiling> = items.iter().filter(|i| !i.is_noise).cloned().collect();
    sort_newest_first(&mut strategic);
    strategic.truncate(n);
    strategic
}

/// Strategic filings published on `today`, newest first.
pub fn today_strategic(items: &[CategorizedFiling], today: NaiveDate) -> Vec<CategorizedFiling> {
    let mut out: Vec<CategorizedFiling> = items
        .iter()
        .filter(|i| !i.is_noise && i.date_published.map(|d| d.date()) == Some(today))
        .cloned()
        .collect();
    sort_newest_first(&mut out);
    out
}

/// Category matrix for the `top_n` busiest companies.
///
/// Companies are ranked on all filings; only strategic filings fill the
/// matrix.
pub fn activity_heatmap(items: &[CategorizedFiling], top_n: usize) -> Heatmap {
    let mut company_tally = Tally::default();
    for item in items {
        company_tally.add(&item.company_name);
    }
    let companies: Vec<String> = company_tally
        .most_common()
        .into_iter()
        .take(top_n)
        .map(|(name, _)| name)
        .collect();
    let top: HashSet<&str> = companies.iter().map(String::as_str).collect();

    let mut category_tally = Tally::default();
    let mut cells: HashMap<(&str, &str), usize> = HashMap::new();
    for item in items
        .iter()
        .filter(|i| !i.is_noise && top.contains(i.company_name.as_str()))
    {
        category_tally.add(item.category);
        *cells.entry((item.company_name.as_str(), item.category)).or_default() += 1;
    }
    let categories: Vec<String> = category_tally
        .most_common()
        .into_iter()
        .map(|(name, _)| name)
        .collect();

    let matrix = companies
        .iter()
        .map(|company| {
            categories
                .iter()
                .map(|cat| {
                    cells
                        .get(&(company.as_str(), cat.as_str()))
                        .copied()
                        .unwrap_or(0)
                })
                .collect()
        })
        .collect();

    Heatmap {
        companies,
        categories,
        matrix,
    }
}

/// Watchlist activity against the whole market.
///
/// A filing belongs to the watchlist when either name contains the other,
/// case-insensitively.
pub fn watchlist_pulse(items: &[CategorizedFiling], watchlist: &[String]) -> WatchlistPulse {
    let names: Vec<String> = watchlist
        .iter()
        .map(|n| n.trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .collect();
    if names.is_empty() || items.is_empty() {
        return WatchlistPulse::default();
    }

    let on_watchlist = |company: &str| {
        let company = company.to_lowercase();
        names
            .iter()
            .any(|w| company.contains(w.as_str()) || w.contains(company.as_str()))
    };

    let mut pulse = WatchlistPulse {
        market_count: items.len(),
        ..Default::default()
    };
    let mut per_company: Vec<WatchlistCompany> = Vec::new();
    for item in items {
        if !item.is_noise {
            pulse.market_strategic += 1;
        }
        if !on_watchlist(&item.company_name) {
            continue;
        }
        pulse.watchlist_count += 1;
        let idx = match per_company.iter().position(|c| c.company == item.company_name) {
            Some(i) => i,
            None => {
                per_company.push(WatchlistCompany {
                    company: item.company_name.clone(),
                    total: 0,
                    strategic: 0,
                });
                per_company.len() - 1
            }
        };
        let entry = &mut per_company[idx];
        entry.total += 1;
        if !item.is_noise {
            entry.strategic += 1;
            pulse.watchlist_strategic += 1;
        }
    }
    per_company.sort_by(|a, b| b.total.cmp(&a.total));

    pulse.watchlist_pct = round_to(pulse.watchlist_count as f64 / pulse.market_count as f64 * 100.0, 1);
    pulse.watchlist_companies = per_company;
    pulse
}

pub const MAX_UPCOMING_EVENTS: usize = 20;

static EVENT_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)(?:notice\s+of|upcoming)\s+.*general\s+meeting", "AGM / General Meeting"),
        (
            r"(?i)(?:notice|release)\s+(?:of|regarding).*(?:financial\s+results|results\s+presentation)",
            "Results Announcement",
        ),
        (r"(?i)distribution\s+(?:of\s+)?circular", "Circular Distribution"),
        (r"(?i)cautionary\s+announcement", "Cautionary Period"),
        (r"(?i)firm\s+intention|general\s+offer", "M&A Event"),
        (r"(?i)trading\s+statement", "Trading Statement"),
    ]
    .into_iter()
    .map(|(p, label)| (Regex::new(p).unwrap(), label))
    .collect()
});

/// Forward-looking corporate events spotted in titles.
///
/// Each title yields at most one event (the first matching pattern); each
/// company yields at most one event per type.
pub fn upcoming_events(items: &[CategorizedFiling]) -> Vec<UpcomingEvent> {
    let mut seen: HashSet<(&str, &'static str)> = HashSet::new();
    let mut events = Vec::new();
    for item in items {
        let Some(&(_, event_type)) = EVENT_PATTERNS.iter().find(|(re, _)| re.is_match(&item.title))
        else {
            continue;
        };
        if !seen.insert((item.company_name.as_str(), event_type)) {
            continue;
        }
        events.push(UpcomingEvent {
            company: item.company_name.clone(),
            event_type,
            title: item.title.clone(),
            date: item.date_published,
            sens_number: item.sens_number.clone(),
            pdf_url: item.pdf_url.clone(),
            ai_summary: item.ai_summary.clone(),
        });
    }
    newest_first(&mut events, |e| e.date);
    events.truncate(MAX_UPCOMING_EVENTS);
    events
}
