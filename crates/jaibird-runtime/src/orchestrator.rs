//! Orchestrator — wires parsing, persistence and enrichment together.

use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use tracing::{error, info, warn};

use jaibird_analytics::{categorize_announcements, AnalyticsReport};
use jaibird_core::{Announcement, ExtractionStatus, JaibirdConfig, Result};
use jaibird_enrich::CompanyEnricher;
use jaibird_ingest::PdfParser;
use jaibird_llm::{LLMConfig, LlmClient, ModelFunction, TextModel, UsageSnapshot};
use jaibird_store::{AnnouncementStore, CompanyStore, TickerRegistry};

use crate::types::*;

/// Top-level orchestrator. Filings are processed one at a time.
pub struct Orchestrator {
    config: JaibirdConfig,
    announcements: Arc<AnnouncementStore>,
    companies: Arc<CompanyStore>,
    registry: Arc<TickerRegistry>,
    parser: PdfParser,
    enricher: CompanyEnricher,
    /// Every distinct model client, for usage totals.
    models: Vec<Arc<dyn TextModel>>,
}

fn client(config: &LLMConfig, function: ModelFunction) -> Option<Arc<dyn TextModel>> {
    let client = LlmClient::for_function(config, function)?;
    Some(Arc::new(client) as Arc<dyn TextModel>)
}

impl Orchestrator {
    /// Open the stores under the data directory and build one model client
    /// per configured function.
    pub fn open(config: JaibirdConfig) -> Result<Self> {
        let paths = &config.data_paths;
        let announcements = Arc::new(AnnouncementStore::open(&paths.announcements_db)?);
        let companies = Arc::new(CompanyStore::open(&paths.company_db)?);
        let registry = Arc::new(TickerRegistry::new(&paths.ticker_registry));

        let llm = LLMConfig::load(&paths.llm_config_file);
        let parse_model = client(&llm, ModelFunction::PdfParse);
        let summary_model = client(&llm, ModelFunction::Summary);
        let enrich_model = client(&llm, ModelFunction::Enrich);
        for (function, model) in [
            (ModelFunction::PdfParse, &parse_model),
            (ModelFunction::Summary, &summary_model),
            (ModelFunction::Enrich, &enrich_model),
        ] {
            match model {
                Some(m) => info!("{} model: {}", function, m.name()),
                None => warn!("No {} model configured; that stage will degrade", function),
            }
        }

        let models = [&parse_model, &summary_model, &enrich_model]
            .into_iter()
            .flatten()
            .cloned()
            .collect();
        let parser = PdfParser::from_config(&config, parse_model, summary_model);
        let enricher = CompanyEnricher::new(companies.clone(), registry.clone(), enrich_model);

        Ok(Self::new(config, announcements, companies, registry, parser, enricher).with_models(models))
    }

    pub fn new(
        config: JaibirdConfig,
        announcements: Arc<AnnouncementStore>,
        companies: Arc<CompanyStore>,
        registry: Arc<TickerRegistry>,
        parser: PdfParser,
        enricher: CompanyEnricher,
    ) -> Self {
        Self {
            config,
            announcements,
            companies,
            registry,
            parser,
            enricher,
            models: Vec::new(),
        }
    }

    /// Models whose usage is reported by the batch commands.
    pub fn with_models(mut self, models: Vec<Arc<dyn TextModel>>) -> Self {
        self.models = models;
        self
    }

    pub fn config(&self) -> &JaibirdConfig {
        &self.config
    }

    pub fn announcements(&self) -> &AnnouncementStore {
        &self.announcements
    }

    pub fn companies(&self) -> &CompanyStore {
        &self.companies
    }

    pub fn registry(&self) -> &TickerRegistry {
        &self.registry
    }

    /// Summed usage across all model clients.
    pub fn usage(&self) -> UsageSnapshot {
        self.models
            .iter()
            .fold(UsageSnapshot::default(), |acc, m| acc + m.usage())
    }

    /// Parse one filing, write the result back, and enrich the company
    /// store when content was extracted.
    pub async fn process(&self, ann: Announcement) -> ProcessOutcome {
        let parsed = self.parser.parse(ann).await;

        let persisted = match self.announcements.update_extraction(&parsed) {
            Ok(()) => true,
            Err(e) => {
                error!("Could not store parse result for SENS {}: {}", parsed.sens_number, e);
                false
            }
        };

        let enrichment = if parsed.content().is_some() {
            Some(self.enricher.enrich(&parsed).await)
        } else {
            None
        };

        ProcessOutcome {
            sens_number: parsed.sens_number.clone(),
            status: parsed.parse_status,
            method: parsed.parse_method,
            summarized: parsed.ai_summary.is_some(),
            persisted,
            enrichment,
        }
    }

    /// Reprocess every pending or failed filing with a local document.
    pub async fn parse_unparsed(&self) -> Result<BatchReport> {
        let pending = self.announcements.list_unparsed()?;
        info!("Found {} unparsed announcements", pending.len());

        let mut report = BatchReport::default();
        for ann in pending {
            report.attempted += 1;
            let outcome = self.process(ann).await;
            if outcome.status == ExtractionStatus::Completed && outcome.persisted {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }
            if outcome
                .enrichment
                .as_ref()
                .is_some_and(|e| e.company_id.is_some())
            {
                report.companies_linked += 1;
            }
        }
        report.usage = self.usage();

        info!(
            "Parse batch complete: {}/{} succeeded ({} model calls, {} failures)",
            report.succeeded, report.attempted, report.usage.calls, report.usage.failures
        );
        Ok(report)
    }

    /// Run enrichment over every filing that already has content.
    pub async fn backfill_companies(&self) -> Result<BatchReport> {
        let filings = self.announcements.list_with_content()?;
        info!("Backfilling company intelligence from {} filings", filings.len());

        let mut report = BatchReport::default();
        for ann in &filings {
            report.attempted += 1;
            let outcome = self.enricher.enrich(ann).await;
            if outcome.company_id.is_some() {
                report.companies_linked += 1;
            }
            if outcome.failures.is_empty() {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }
        }
        report.usage = self.usage();

        info!(
            "Backfill complete: {} filings, {} companies in store",
            report.attempted,
            self.companies.count_companies().unwrap_or(0)
        );
        Ok(report)
    }

    /// Aggregations over stored filings, optionally limited to the last `days`.
    pub fn report(
        &self,
        now: NaiveDateTime,
        days: Option<i64>,
        watchlist: &[String],
    ) -> Result<AnalyticsReport> {
        let filings = match days {
            Some(days) => self.announcements.list_since(now - Duration::days(days))?,
            None => self.announcements.list_all()?,
        };
        let categorized = categorize_announcements(&filings);
        Ok(AnalyticsReport::build(
            &categorized,
            now,
            &self.config.analytics,
            watchlist,
        ))
    }
}
