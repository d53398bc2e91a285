//! Announcement record and extraction lifecycle types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// How the announcement's text content was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMethod {
    /// Page images run through text recognition, quality judged good.
    RecognizedText,
    /// Recognition was poor; text recovered and cleaned by the fallback path.
    AiAssisted,
    /// An unexpected error aborted the attempt.
    Failed,
    /// No attempt made, or no document to attempt it on.
    #[default]
    None,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RecognizedText => "recognized-text",
            Self::AiAssisted => "ai-assisted",
            Self::Failed => "failed",
            Self::None => "none",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "recognized-text" => Self::RecognizedText,
            "ai-assisted" => Self::AiAssisted,
            "failed" => Self::Failed,
            _ => Self::None,
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extraction lifecycle: pending → processing → completed | failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ExtractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }

    /// Whether `next` is a legal transition from `self`.
    ///
    /// A finished record (completed or failed) may re-enter `Processing`
    /// when an operator reprocesses it; otherwise status only moves forward.
    pub fn can_advance_to(&self, next: ExtractionStatus) -> bool {
        use ExtractionStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Failed)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Completed, Processing)
                | (Failed, Processing)
        )
    }
}

impl std::fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One regulatory filing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Announcement {
    /// Exchange-assigned filing identifier (e.g. `S512345`). Immutable.
    pub sens_number: String,
    /// Issuer name as scraped, not normalized.
    pub company_name: String,
    pub title: String,
    /// Source document URL on the exchange website.
    pub pdf_url: String,
    /// Local cached copy of the source document.
    pub local_pdf_path: Option<String>,
    pub date_published: Option<NaiveDateTime>,
    pub date_scraped: Option<NaiveDateTime>,
    pub is_urgent: bool,
    pub urgent_reason: String,
    /// Extracted text content; `None` until parsed.
    pub pdf_content: Option<String>,
    /// Generated digest; never set while `pdf_content` is empty.
    pub ai_summary: Option<String>,
    pub parse_method: ExtractionMethod,
    pub parse_status: ExtractionStatus,
    pub parsed_at: Option<NaiveDateTime>,
}

impl Announcement {
    pub fn new(
        sens_number: impl Into<String>,
        company_name: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            sens_number: sens_number.into(),
            company_name: company_name.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Move to `next` if the transition is legal. Returns whether it moved.
    pub fn advance_status(&mut self, next: ExtractionStatus) -> bool {
        if self.parse_status.can_advance_to(next) {
            self.parse_status = next;
            true
        } else {
            tracing::warn!(
                "Rejected status transition {} -> {} for SENS {}",
                self.parse_status,
                next,
                self.sens_number
            );
            false
        }
    }

    /// Set the summary, keeping it empty whenever there is no content.
    pub fn set_summary(&mut self, summary: String) {
        let has_content = self
            .pdf_content
            .as_deref()
            .map(|c| !c.trim().is_empty())
            .unwrap_or(false);
        self.ai_summary = if has_content && !summary.trim().is_empty() {
            Some(summary)
        } else {
            None
        };
    }

    /// Non-empty extracted content, if any.
    pub fn content(&self) -> Option<&str> {
        self.pdf_content.as_deref().filter(|c| !c.trim().is_empty())
    }
}

/// Outcome of one best-effort stage in a fallback chain.
///
/// Lets callers distinguish "no data" from "data present but low quality"
/// without relying on empty-string sentinels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageResult<T> {
    /// The stage produced what it set out to produce.
    Success(T),
    /// The stage fell back to a lesser value (raw text, older description).
    Degraded { value: T, reason: String },
    /// Nothing usable was produced.
    Empty,
}

impl<T> StageResult<T> {
    pub fn degraded(value: T, reason: impl Into<String>) -> Self {
        Self::Degraded {
            value,
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Success(v) | Self::Degraded { value: v, .. } => Some(v),
            Self::Empty => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Success(v) | Self::Degraded { value: v, .. } => Some(v),
            Self::Empty => None,
        }
    }
}

impl StageResult<String> {
    /// The text carried by this stage, or an empty string.
    pub fn into_text(self) -> String {
        self.into_value().unwrap_or_default()
    }
}
