//! Folds one filing into the company intelligence store.
//!
//! Regex extraction always runs; the model pass is an optional layer on
//! top. Each step is isolated: a failed step is logged and recorded in the
//! report, and the remaining steps still run.

use std::fmt::Display;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::facts::{self, CompanyFacts};
use crate::patterns;
use jaibird_core::{Announcement, StageResult};
use jaibird_llm::{CompletionRequest, TextModel};
use jaibird_store::{
    format_timestamp, normalize_ticker, CompanyStore, TickerRegistry, TickerUpdate,
};

/// Content shorter than this is not worth a model call.
pub const MIN_MODEL_CHARS: usize = 50;

const FACTS_MAX_TOKENS: usize = 1000;
const MERGE_MAX_TOKENS: usize = 300;
const TEMPERATURE: f64 = 0.1;

/// What happened to the stored description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionUpdate {
    /// No previous description; the new one was stored verbatim.
    Stored,
    /// Same as the stored one.
    Unchanged,
    /// Old and new were merged by the model.
    Merged,
    /// The merge call failed; the newer description replaced the old one.
    KeptNewer,
}

/// Outcome of enriching one filing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EnrichmentReport {
    pub company_id: Option<i64>,
    pub ticker: Option<String>,
    /// False when the filing was already linked.
    pub filing_linked: bool,
    pub sponsor: Option<String>,
    pub website: Option<String>,
    pub facts_applied: bool,
    pub description: Option<DescriptionUpdate>,
    pub directors_appointed: usize,
    pub directors_resigned: usize,
    pub ticker_registered: bool,
    /// Steps that failed, with the error.
    pub failures: Vec<String>,
}

impl EnrichmentReport {
    fn fail(&mut self, step: &str, sens: &str, err: impl Display) {
        warn!("Enrichment step '{}' failed for SENS {}: {}", step, sens, err);
        self.failures.push(format!("{}: {}", step, err));
    }
}

pub struct CompanyEnricher {
    companies: Arc<CompanyStore>,
    registry: Arc<TickerRegistry>,
    model: Option<Arc<dyn TextModel>>,
}

impl CompanyEnricher {
    pub fn new(
        companies: Arc<CompanyStore>,
        registry: Arc<TickerRegistry>,
        model: Option<Arc<dyn TextModel>>,
    ) -> Self {
        Self {
            companies,
            registry,
            model,
        }
    }

    /// Update the company store from `ann`. Never fails.
    pub async fn enrich(&self, ann: &Announcement) -> EnrichmentReport {
        let mut report = EnrichmentReport::default();
        let sens = ann.sens_number.as_str();

        let mut ticker = patterns::derive_ticker(&ann.company_name);

        match self
            .companies
            .upsert_company(&ann.company_name, ticker.as_deref(), None)
        {
            Ok(company_id) => {
                report.company_id = Some(company_id);
                self.enrich_company(company_id, ann, &mut ticker, &mut report)
                    .await;
            }
            Err(e) => {
                error!("Could not upsert company for SENS {}: {}", sens, e);
                report.failures.push(format!("upsert company: {}", e));
            }
        }

        if let Some(code) = &ticker {
            match self.registry.append(code) {
                Ok(added) => report.ticker_registered = added,
                Err(e) => report.fail("ticker registry", sens, e),
            }
        }
        report.ticker = ticker;

        info!(
            "Enriched company {:?} from SENS {} (linked={}, facts={})",
            report.company_id, sens, report.filing_linked, report.facts_applied
        );
        report
    }

    /// Steps that need a company row: filing link, sponsor, website, facts.
    async fn enrich_company(
        &self,
        company_id: i64,
        ann: &Announcement,
        ticker: &mut Option<String>,
        report: &mut EnrichmentReport,
    ) {
        let sens = ann.sens_number.as_str();
        let source = format!("SENS:{}", sens);

        let published = ann.date_published.map(format_timestamp);
        match self
            .companies
            .link_filing(company_id, sens, published.as_deref(), &ann.title)
        {
            Ok(linked) => report.filing_linked = linked,
            Err(e) => report.fail("link filing", sens, e),
        }

        let content = ann.content();

        if let Some(sponsor) = content.and_then(patterns::extract_sponsor) {
            match self.companies.set_sponsor(company_id, &sponsor, &source) {
                Ok(_) => report.sponsor = Some(sponsor),
                Err(e) => report.fail("sponsor", sens, e),
            }
        }

        if let Some(website) = content.and_then(patterns::extract_website) {
            match self
                .companies
                .upsert_company(&ann.company_name, None, Some(&website))
            {
                Ok(_) => report.website = Some(website),
                Err(e) => report.fail("website", sens, e),
            }
        }

        let model_input = content.filter(|t| t.trim().chars().count() >= MIN_MODEL_CHARS);
        if let (Some(text), Some(model)) = (model_input, &self.model) {
            if let Some(found) = self.request_facts(model.as_ref(), ann, text).await {
                self.apply_facts(model.as_ref(), company_id, ann, &found, ticker, report)
                    .await;
                report.facts_applied = true;
            }
        } else if model_input.is_some() {
            debug!("No enrichment model configured; regex only for SENS {}", sens);
        }
    }

    async fn request_facts(
        &self,
        model: &dyn TextModel,
        ann: &Announcement,
        text: &str,
    ) -> Option<CompanyFacts> {
        let request = CompletionRequest::new(facts::extraction_prompt(ann, text))
            .with_system(facts::EXTRACTION_SYSTEM)
            .with_max_tokens(FACTS_MAX_TOKENS)
            .with_temperature(TEMPERATURE);

        let reply = match model.complete(request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Fact extraction call failed for SENS {}: {}", ann.sens_number, e);
                return None;
            }
        };
        let parsed = facts::parse_facts(&reply);
        if parsed.is_none() {
            warn!(
                "Unparsable fact extraction reply for SENS {} ({} chars)",
                ann.sens_number,
                reply.len()
            );
        }
        parsed
    }

    async fn apply_facts(
        &self,
        model: &dyn TextModel,
        mut company_id: i64,
        ann: &Announcement,
        found: &CompanyFacts,
        ticker: &mut Option<String>,
        report: &mut EnrichmentReport,
    ) {
        let sens = ann.sens_number.as_str();
        let source = format!("SENS:{}", sens);

        if let Some(code) = facts::present(&found.ticker).and_then(normalize_ticker) {
            match self.companies.set_ticker(company_id, &code) {
                Ok(TickerUpdate::OwnedBy(owner)) => {
                    // The ticker identifies the company; write the rest to its owner
                    info!(
                        "SENS {}: ticker {} belongs to company {}, not {}",
                        sens, code, owner, company_id
                    );
                    company_id = owner;
                    report.company_id = Some(owner);
                    let published = ann.date_published.map(format_timestamp);
                    if let Err(e) =
                        self.companies
                            .link_filing(owner, sens, published.as_deref(), &ann.title)
                    {
                        report.fail("link filing", sens, e);
                    }
                    *ticker = Some(code);
                }
                Ok(_) => *ticker = Some(code),
                Err(e) => report.fail("ticker", sens, e),
            }
        }

        if let Some(sponsor) = facts::present(&found.sponsor) {
            match self.companies.set_sponsor(company_id, sponsor, &source) {
                Ok(_) => report.sponsor = Some(sponsor.to_string()),
                Err(e) => report.fail("sponsor", sens, e),
            }
        }

        if let Some(sector) = facts::present(&found.sector) {
            if let Err(e) = self.companies.update_sector(company_id, sector) {
                report.fail("sector", sens, e);
            }
        }

        if let Some(description) = facts::present(&found.description) {
            match self
                .update_description(model, company_id, &ann.company_name, description)
                .await
            {
                Ok(outcome) => report.description = Some(outcome),
                Err(e) => report.fail("description", sens, e),
            }
        }

        for director in &found.directors_appointed {
            if director.name().is_empty() {
                continue;
            }
            match self.companies.add_director(
                company_id,
                director.name(),
                director.role(),
                director.date(),
                sens,
            ) {
                Ok(_) => report.directors_appointed += 1,
                Err(e) => report.fail("director appointment", sens, e),
            }
        }

        for director in &found.directors_resigned {
            if director.name().is_empty() {
                continue;
            }
            match self.companies.resign_director(
                company_id,
                director.name(),
                director.role(),
                director.date(),
                sens,
            ) {
                Ok(_) => report.directors_resigned += 1,
                Err(e) => report.fail("director resignation", sens, e),
            }
        }
    }

    async fn update_description(
        &self,
        model: &dyn TextModel,
        company_id: i64,
        company: &str,
        incoming: &str,
    ) -> jaibird_core::Result<DescriptionUpdate> {
        let existing = self.companies.get_description(company_id)?;
        let existing = existing.trim();
        if existing.is_empty() {
            self.companies.update_description(company_id, incoming)?;
            return Ok(DescriptionUpdate::Stored);
        }
        if existing == incoming {
            return Ok(DescriptionUpdate::Unchanged);
        }

        let merged = self.merge_descriptions(model, company, existing, incoming).await;
        let outcome = if merged.is_success() {
            DescriptionUpdate::Merged
        } else {
            DescriptionUpdate::KeptNewer
        };
        if let Some(text) = merged.into_value() {
            self.companies.update_description(company_id, &text)?;
        }
        Ok(outcome)
    }

    async fn merge_descriptions(
        &self,
        model: &dyn TextModel,
        company: &str,
        existing: &str,
        incoming: &str,
    ) -> StageResult<String> {
        let request = CompletionRequest::new(facts::merge_prompt(company, existing, incoming))
            .with_max_tokens(MERGE_MAX_TOKENS)
            .with_temperature(TEMPERATURE);
        match model.complete(request).await {
            Ok(merged) if !merged.trim().is_empty() => StageResult::Success(merged.trim().to_string()),
            Ok(_) => StageResult::degraded(incoming.to_string(), "empty merge reply"),
            Err(e) => {
                warn!("Description merge failed for {}: {}", company, e);
                StageResult::degraded(incoming.to_string(), e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use jaibird_llm::testing::ScriptedModel;
    use jaibird_store::ResignOutcome;
    use tempfile::TempDir;

    const CONTENT: &str = "Shareholders are advised of the appointment of a new chief financial officer \
        with effect from 1 March 2025. Further information is available at https://www.acme.co.za/sens.\n\n\
        JSE Sponsor: Java Capital\n";

    const FACTS: &str = r#"```json
{"ticker": "ACM", "sponsor": "Java Capital", "sector": "Industrial",
 "description": "Acme manufactures industrial anvils and forge equipment.",
 "directors_appointed": [{"name": "Jane Doe", "role": "Chief Financial Officer", "date": "2025-03-01"}],
 "directors_resigned": [{"name": "John Smith", "role": "Chief Financial Officer"}]}
```"#;

    struct Fixture {
        companies: Arc<CompanyStore>,
        registry: Arc<TickerRegistry>,
        _dir: TempDir,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        Fixture {
            companies: Arc::new(CompanyStore::open(dir.path().join("company_intel.db")).unwrap()),
            registry: Arc::new(TickerRegistry::new(dir.path().join("jse_tickers.txt"))),
            _dir: dir,
        }
    }

    fn enricher(fx: &Fixture, model: Option<Arc<ScriptedModel>>) -> CompanyEnricher {
        CompanyEnricher::new(
            fx.companies.clone(),
            fx.registry.clone(),
            model.map(|m| m as Arc<dyn TextModel>),
        )
    }

    fn announcement(company: &str, content: Option<&str>) -> Announcement {
        let mut ann = Announcement::new("S500100", company, "Appointment of chief financial officer");
        ann.date_published = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0);
        ann.pdf_content = content.map(str::to_string);
        ann
    }

    #[tokio::test]
    async fn test_regex_only_without_model() {
        let fx = fixture();
        let report = enricher(&fx, None)
            .enrich(&announcement("Acme Ltd (ACM)", Some(CONTENT)))
            .await;

        assert!(report.failures.is_empty(), "{:?}", report.failures);
        assert!(report.filing_linked);
        assert!(!report.facts_applied);
        assert_eq!(report.sponsor.as_deref(), Some("Java Capital"));
        assert_eq!(report.website.as_deref(), Some("https://www.acme.co.za/sens"));

        let company = fx.companies.get_company(report.company_id.unwrap()).unwrap().unwrap();
        assert_eq!(company.jse_code.as_deref(), Some("ACM"));
        assert_eq!(company.sponsor, "Java Capital");
        assert_eq!(company.website, "https://www.acme.co.za/sens");
        assert!(fx.registry.load().unwrap().contains("ACM"));
    }

    #[tokio::test]
    async fn test_garbage_model_reply_still_links_company() {
        let fx = fixture();
        let model = Arc::new(ScriptedModel::always("Sorry, I am unable to produce JSON today."));
        let report = enricher(&fx, Some(model.clone()))
            .enrich(&announcement("Acme Ltd", Some(CONTENT)))
            .await;

        assert_eq!(model.call_count(), 1);
        assert!(!report.facts_applied);
        assert!(report.failures.is_empty());
        let id = report.company_id.unwrap();
        assert_eq!(fx.companies.get_company_sens(id, 10).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_model_failure_still_links_company() {
        let fx = fixture();
        let report = enricher(&fx, Some(Arc::new(ScriptedModel::failing())))
            .enrich(&announcement("Acme Ltd", Some(CONTENT)))
            .await;
        assert!(report.company_id.is_some());
        assert!(report.filing_linked);
        assert!(!report.facts_applied);
    }

    #[tokio::test]
    async fn test_facts_applied_and_description_stored() {
        let fx = fixture();
        let model = Arc::new(ScriptedModel::new(vec![Some(FACTS.into())]));
        let report = enricher(&fx, Some(model.clone()))
            .enrich(&announcement("Acme Ltd", Some(CONTENT)))
            .await;

        assert!(report.facts_applied);
        assert_eq!(report.description, Some(DescriptionUpdate::Stored));
        assert_eq!(report.directors_appointed, 1);
        assert_eq!(report.directors_resigned, 1);
        assert_eq!(report.ticker.as_deref(), Some("ACM"));
        assert!(report.ticker_registered);
        // Only the extraction call; no merge needed
        assert_eq!(model.call_count(), 1);

        let id = report.company_id.unwrap();
        let company = fx.companies.get_company(id).unwrap().unwrap();
        assert_eq!(company.jse_code.as_deref(), Some("ACM"));
        assert_eq!(company.sector, "Industrial");
        assert_eq!(
            company.description,
            "Acme manufactures industrial anvils and forge equipment."
        );

        let directors = fx.companies.get_directors(id, false).unwrap();
        assert_eq!(directors.len(), 2);
        let jane = directors.iter().find(|d| d.name == "Jane Doe").unwrap();
        assert!(jane.is_active);
        assert_eq!(jane.appointed_date.as_deref(), Some("2025-03-01"));
        let john = directors.iter().find(|d| d.name == "John Smith").unwrap();
        assert!(!john.is_active);
    }

    #[tokio::test]
    async fn test_description_merge_and_fallback() {
        let fx = fixture();
        let id = fx.companies.upsert_company("Acme Ltd", None, None).unwrap();
        fx.companies.update_description(id, "Acme makes anvils.").unwrap();

        let model = Arc::new(ScriptedModel::new(vec![
            Some(FACTS.into()),
            Some("Acme makes anvils and forge equipment.".into()),
        ]));
        let report = enricher(&fx, Some(model.clone()))
            .enrich(&announcement("Acme Ltd", Some(CONTENT)))
            .await;
        assert_eq!(report.description, Some(DescriptionUpdate::Merged));
        assert_eq!(
            fx.companies.get_description(id).unwrap(),
            "Acme makes anvils and forge equipment."
        );
        assert!(model.requests()[1].prompt.contains("EXISTING: Acme makes anvils."));

        // Merge call fails: the newer description wins
        let model = Arc::new(ScriptedModel::new(vec![
            Some(FACTS.replace("forge equipment", "hammers")),
            None,
        ]));
        let report = enricher(&fx, Some(model))
            .enrich(&announcement("Acme Ltd", Some(CONTENT)))
            .await;
        assert_eq!(report.description, Some(DescriptionUpdate::KeptNewer));
        assert_eq!(
            fx.companies.get_description(id).unwrap(),
            "Acme manufactures industrial anvils and hammers."
        );
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let fx = fixture();
        let e = enricher(&fx, Some(Arc::new(ScriptedModel::always(FACTS))));
        let ann = announcement("Acme Ltd (ACM)", Some(CONTENT));

        let first = e.enrich(&ann).await;
        let second = e.enrich(&ann).await;
        let third = e.enrich(&ann).await;

        assert_eq!(first.company_id, second.company_id);
        assert_eq!(first.company_id, third.company_id);
        assert!(first.filing_linked);
        assert!(!second.filing_linked);
        assert!(!second.ticker_registered);
        assert_eq!(second.description, Some(DescriptionUpdate::Unchanged));

        let id = first.company_id.unwrap();
        assert_eq!(fx.companies.count_companies().unwrap(), 1);
        assert_eq!(fx.companies.get_sponsor_history(id).unwrap().len(), 1);
        assert_eq!(fx.companies.get_directors(id, true).unwrap().len(), 1);
        // One active appointee and one resigned director, however many runs
        assert_eq!(fx.companies.get_directors(id, false).unwrap().len(), 2);

        let outcome = fx
            .companies
            .resign_director(id, "Jane Doe", "", None, "S1")
            .unwrap();
        assert_eq!(outcome, ResignOutcome::MarkedInactive);
        let outcome = fx
            .companies
            .resign_director(id, "John Smith", "", None, "S500100")
            .unwrap();
        assert_eq!(outcome, ResignOutcome::AlreadyResigned);
    }

    #[tokio::test]
    async fn test_model_ticker_owned_by_another_company() {
        let fx = fixture();
        let owner = fx
            .companies
            .upsert_company("Acme Limited (ACM)", Some("ACM"), None)
            .unwrap();
        let model = Arc::new(ScriptedModel::always(r#"{"ticker": "ACM", "sector": "Industrial"}"#));

        let report = enricher(&fx, Some(model))
            .enrich(&announcement("Acme Ltd", Some(CONTENT)))
            .await;

        assert!(report.facts_applied);
        assert_eq!(report.company_id, Some(owner));
        assert_eq!(report.ticker.as_deref(), Some("ACM"));

        let holders: Vec<_> = fx
            .companies
            .get_all_profiles()
            .unwrap()
            .into_iter()
            .filter(|c| c.profile.jse_code.as_deref() == Some("ACM"))
            .collect();
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].profile.id, owner);
        assert_eq!(fx.companies.get_sector(owner).unwrap(), "Industrial");
        assert_eq!(fx.companies.get_company_sens(owner, 10).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ticker_registered_when_upsert_fails() {
        let fx = fixture();
        let conn = rusqlite::Connection::open(fx._dir.path().join("company_intel.db")).unwrap();
        conn.execute_batch(
            "CREATE TRIGGER reject_companies BEFORE INSERT ON companies \
             BEGIN SELECT RAISE(ABORT, 'companies are read-only'); END;",
        )
        .unwrap();

        let report = enricher(&fx, None)
            .enrich(&announcement("Acme Ltd (ACM)", Some(CONTENT)))
            .await;

        assert!(report.company_id.is_none());
        assert!(!report.filing_linked);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].starts_with("upsert company"));
        assert_eq!(report.ticker.as_deref(), Some("ACM"));
        assert!(report.ticker_registered);
        assert!(fx.registry.load().unwrap().contains("ACM"));
    }

    #[tokio::test]
    async fn test_short_content_skips_model() {
        let fx = fixture();
        let model = Arc::new(ScriptedModel::always(FACTS));
        let report = enricher(&fx, Some(model.clone()))
            .enrich(&announcement("Acme Ltd", Some("Too short.")))
            .await;
        assert_eq!(model.call_count(), 0);
        assert!(report.filing_linked);

        let report = enricher(&fx, Some(model.clone()))
            .enrich(&announcement("Other Ltd", None))
            .await;
        assert_eq!(model.call_count(), 0);
        assert!(report.company_id.is_some());
    }
}
