//! Model-assisted structured extraction of company facts.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use jaibird_core::text::truncate_chars;
use jaibird_core::Announcement;

/// Characters of filing text sent for extraction.
pub const EXTRACTION_WINDOW: usize = 8000;

static BRACED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

pub const EXTRACTION_SYSTEM: &str =
    "You extract structured company facts from JSE SENS announcements. Reply with JSON only.";

/// Facts the model reports for one filing. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyFacts {
    pub ticker: Option<String>,
    pub name: Option<String>,
    pub sponsor: Option<String>,
    pub description: Option<String>,
    pub sector: Option<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub directors_appointed: Vec<DirectorEntry>,
    #[serde(deserialize_with = "null_as_empty")]
    pub directors_resigned: Vec<DirectorEntry>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<DirectorEntry>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<DirectorEntry>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A director as reported: a bare name or a detailed object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DirectorEntry {
    Name(String),
    Detail {
        name: String,
        #[serde(default)]
        role: Option<String>,
        #[serde(default)]
        date: Option<String>,
    },
}

impl DirectorEntry {
    pub fn name(&self) -> &str {
        match self {
            DirectorEntry::Name(name) => name.trim(),
            DirectorEntry::Detail { name, .. } => name.trim(),
        }
    }

    pub fn role(&self) -> &str {
        match self {
            DirectorEntry::Detail { role: Some(role), .. } => role.trim(),
            _ => "",
        }
    }

    pub fn date(&self) -> Option<&str> {
        match self {
            DirectorEntry::Detail { date: Some(date), .. } if !date.trim().is_empty() => {
                Some(date.trim())
            }
            _ => None,
        }
    }
}

/// Non-empty trimmed value of an optional field.
pub fn present(field: &Option<String>) -> Option<&str> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null"))
}

pub fn extraction_prompt(ann: &Announcement, content: &str) -> String {
    format!(
        r#"Extract company information from this JSE SENS announcement.

Company: {company}
Title: {title}
SENS: {sens}

Return a single JSON object with exactly these keys:
{{
  "ticker": "JSE share code (max 5 characters) or null",
  "name": "registered company name or null",
  "sponsor": "JSE sponsor or designated adviser or null",
  "description": "1-2 sentence description of what the company does, or null",
  "sector": "industry sector (e.g. Mining, Banking, Retail, Property) or null",
  "directors_appointed": [{{"name": "...", "role": "...", "date": "YYYY-MM-DD or null"}}],
  "directors_resigned": [{{"name": "...", "role": "...", "date": "YYYY-MM-DD or null"}}]
}}

Only report facts stated in the text. Use null or [] when a fact is absent.

Text:
{text}"#,
        company = ann.company_name,
        title = ann.title,
        sens = ann.sens_number,
        text = truncate_chars(content, EXTRACTION_WINDOW),
    )
}

pub fn merge_prompt(company: &str, existing: &str, incoming: &str) -> String {
    format!(
        r#"Two descriptions of {company} follow. Write one merged description of 1-3 sentences.
Where they conflict, keep the facts from the NEW description; it is the most current.
Return only the description.

EXISTING: {existing}

NEW: {incoming}"#
    )
}

/// Parse a model reply into facts.
///
/// Tries the reply as-is, then the contents of a markdown code fence, then
/// the outermost brace-delimited span.
pub fn parse_facts(response: &str) -> Option<CompanyFacts> {
    let trimmed = response.trim();
    if let Ok(facts) = serde_json::from_str::<CompanyFacts>(trimmed) {
        return Some(facts);
    }
    if let Some(fenced) = strip_code_fence(trimmed) {
        if let Ok(facts) = serde_json::from_str::<CompanyFacts>(fenced) {
            return Some(facts);
        }
    }
    let braced = BRACED.find(trimmed)?;
    serde_json::from_str::<CompanyFacts>(braced.as_str()).ok()
}

fn strip_code_fence(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```json") {
        let body = &text[start + 7..];
        return body.find("```").map(|end| body[..end].trim());
    }
    let start = text.find("```")?;
    let after = &text[start + 3..];
    // Skip a language tag on the opening fence line
    let body = after.find('\n').map(|i| &after[i + 1..]).unwrap_or(after);
    body.find("```").map(|end| body[..end].trim())
}
