//! Runtime types.

use serde::Serialize;

use jaibird_core::{ExtractionMethod, ExtractionStatus};
use jaibird_enrich::EnrichmentReport;
use jaibird_llm::UsageSnapshot;

/// What happened to one filing in the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub sens_number: String,
    pub status: ExtractionStatus,
    pub method: ExtractionMethod,
    pub summarized: bool,
    /// False when the parsed record could not be written back.
    pub persisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<EnrichmentReport>,
}

/// Totals for a batch command.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Filings whose company ended up linked in the company store.
    pub companies_linked: usize,
    pub usage: UsageSnapshot,
}
