//! Regex extraction of tickers, sponsors and websites. No model involved.

use once_cell::sync::Lazy;
use regex::Regex;

/// `Naspers Limited (NPN)`
static PAREN_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([A-Z][A-Z0-9]{1,4})\)").unwrap());

/// `Sasol Limited - SOL`, `SASOL SOL`
static TRAILING_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[\s\-–:])([A-Z][A-Z0-9]{1,4})\s*$").unwrap());

static SPONSOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:jse\s+sponsor|designated\s+advis[eo]r|sponsor)\s*[:\-–]\s*([^\r\n]+)").unwrap()
});

static WEBSITE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[\w./\-]+").unwrap());

/// Trailing words that are legal-form suffixes, never tickers.
const NOT_TICKERS: &[&str] = &[
    "LTD", "PLC", "INC", "CORP", "CO", "SA", "NV", "AG", "SE", "RF", "BV", "LLC", "GROUP",
    "FUND", "TRUST", "BANK", "ETF", "ETN", "REIT", "SPV",
];

pub const SPONSOR_MIN_LEN: usize = 3;
pub const SPONSOR_MAX_LEN: usize = 80;

/// Candidate ticker from the scraped company-name field.
pub fn derive_ticker(company_name: &str) -> Option<String> {
    let name = company_name.trim();
    let from_paren = PAREN_CODE
        .captures_iter(name)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .find(|code| !NOT_TICKERS.contains(code));
    if let Some(code) = from_paren {
        return Some(code.to_string());
    }

    let code = TRAILING_CODE.captures(name)?.get(1)?.as_str();
    // A lone word is a name, not "<name> <code>".
    if code.len() == name.len() || NOT_TICKERS.contains(&code) {
        return None;
    }
    Some(code.to_string())
}

/// Sponsor or designated adviser named in the filing text.
pub fn extract_sponsor(text: &str) -> Option<String> {
    for caps in SPONSOR.captures_iter(text) {
        let Some(raw) = caps.get(1) else { continue };
        let mut value = raw.as_str();
        for stop in ["...", "…"] {
            if let Some(idx) = value.find(stop) {
                value = &value[..idx];
            }
        }
        let value = value
            .trim()
            .trim_end_matches(|c: char| c == '.' || c == ',' || c == ';')
            .trim();
        let len = value.chars().count();
        if (SPONSOR_MIN_LEN..=SPONSOR_MAX_LEN).contains(&len) {
            return Some(value.to_string());
        }
    }
    None
}

/// First http(s) URL in the text.
pub fn extract_website(text: &str) -> Option<String> {
    WEBSITE
        .find(text)
        .map(|m| m.as_str().trim_end_matches(['.', '/']).to_string())
        .filter(|url| url.len() > "https://".len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_from_parentheses() {
        assert_eq!(derive_ticker("Naspers Limited (NPN)"), Some("NPN".into()));
        assert_eq!(derive_ticker("Acme (RF) Ltd (ACM)"), Some("ACM".into()));
        assert_eq!(derive_ticker("Growthpoint Properties Ltd (GRT) "), Some("GRT".into()));
    }

    #[test]
    fn test_ticker_from_trailing_token() {
        assert_eq!(derive_ticker("Sasol Limited - SOL"), Some("SOL".into()));
        assert_eq!(derive_ticker("Anglo American Platinum AMS"), Some("AMS".into()));
        assert_eq!(derive_ticker("MTN GROUP"), None);
        assert_eq!(derive_ticker("Shoprite Holdings Ltd"), None);
        assert_eq!(derive_ticker("ABSA"), None);
        assert_eq!(derive_ticker(""), None);
    }

    #[test]
    fn test_sponsor_cut_at_newline_and_ellipsis() {
        let text = "Johannesburg\n12 March 2025\n\nJSE Sponsor: Java Capital\nLegal adviser: Webber Wentzel";
        assert_eq!(extract_sponsor(text), Some("Java Capital".into()));

        let text = "Sponsor - Rand Merchant Bank (A division of FirstRand Bank Limited)...";
        assert_eq!(
            extract_sponsor(text),
            Some("Rand Merchant Bank (A division of FirstRand Bank Limited)".into())
        );

        let text = "Designated Adviser: PSG Capital…see below";
        assert_eq!(extract_sponsor(text), Some("PSG Capital".into()));
    }

    #[test]
    fn test_sponsor_length_bounds() {
        assert_eq!(extract_sponsor("Sponsor: X\n"), None);
        let long = format!("Sponsor: {}", "A".repeat(120));
        assert_eq!(extract_sponsor(&long), None);
        assert_eq!(extract_sponsor("no sponsor mentioned here"), None);
    }

    #[test]
    fn test_first_website() {
        let text = "Visit https://www.acme-holdings.co.za/investors. Or http://other.com";
        assert_eq!(
            extract_website(text),
            Some("https://www.acme-holdings.co.za/investors".into())
        );
        assert_eq!(extract_website("no links"), None);
    }
}
