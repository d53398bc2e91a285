//! JAIBird Enrich — company intelligence built up from filings.
//!
//! Regex extraction (ticker, sponsor, website) always runs; structured
//! fact extraction runs when an enrichment model is configured.

pub mod enricher;
pub mod facts;
pub mod patterns;

pub use enricher::{CompanyEnricher, DescriptionUpdate, EnrichmentReport, MIN_MODEL_CHARS};
pub use facts::{parse_facts, CompanyFacts, DirectorEntry};
pub use patterns::{derive_ticker, extract_sponsor, extract_website};
