//! Provider identifiers and request types.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// LLM provider identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LLMProvider {
    OpenAI,
    Anthropic,
}

impl LLMProvider {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Some(Self::OpenAI),
            "anthropic" => Some(Self::Anthropic),
            _ => None,
        }
    }
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
        }
    }
}

/// Pipeline function a model is configured for. Each may use a
/// different provider and model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFunction {
    /// Cleanup of poorly recognized document text.
    PdfParse,
    /// Announcement digests.
    Summary,
    /// Structured company fact extraction.
    Enrich,
}

impl std::fmt::Display for ModelFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelFunction::PdfParse => write!(f, "pdf_parse"),
            ModelFunction::Summary => write!(f, "summary"),
            ModelFunction::Enrich => write!(f, "enrich"),
        }
    }
}

/// One non-streaming completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub max_tokens: usize,
    pub temperature: f64,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            max_tokens: 1000,
            temperature: 0.1,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Call counters for one client.
#[derive(Debug, Default)]
pub struct UsageStats {
    calls: AtomicU64,
    failures: AtomicU64,
}

impl UsageStats {
    pub fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            calls: self.calls.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`UsageStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsageSnapshot {
    pub calls: u64,
    pub failures: u64,
}

impl std::ops::Add for UsageSnapshot {
    type Output = UsageSnapshot;

    fn add(self, other: UsageSnapshot) -> UsageSnapshot {
        UsageSnapshot {
            calls: self.calls + other.calls,
            failures: self.failures + other.failures,
        }
    }
}
