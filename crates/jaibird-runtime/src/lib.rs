//! Runtime orchestrator — parse, persist and enrich filings.
//!
//! Provides the batch operations behind the operator commands
//! (reprocess unparsed filings, company backfill, analytics report).

pub mod orchestrator;
pub mod types;

pub use orchestrator::Orchestrator;
pub use types::*;
