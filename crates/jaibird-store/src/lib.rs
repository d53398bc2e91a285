//! JAIBird Store — company intelligence, announcement table, ticker registry.

pub mod announcements;
pub mod company;
pub mod registry;
pub mod schema;
pub mod types;

pub use announcements::AnnouncementStore;
pub use company::CompanyStore;
pub use registry::TickerRegistry;
pub use types::*;

use chrono::NaiveDateTime;

/// Text format for every timestamp column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp. Accepts the space- or `T`-separated form.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

pub(crate) fn now_timestamp() -> String {
    format_timestamp(chrono::Local::now().naive_local())
}

/// Upper-cased ticker if `code` looks like one: 1-5 ASCII alphanumerics.
pub fn normalize_ticker(code: &str) -> Option<String> {
    let code = code.trim();
    if code.is_empty() || code.len() > 5 || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(code.to_ascii_uppercase())
}
