//! Operator command implementations.

use anyhow::{anyhow, bail, Context};
use chrono::Local;

use jaibird_analytics::categorize_title;
use jaibird_runtime::{BatchReport, Orchestrator};

/// Options for `report`.
#[derive(Debug, Default, PartialEq)]
pub struct ReportArgs {
    pub days: Option<i64>,
    pub watchlist: Vec<String>,
}

pub fn parse_report_args(args: &[String]) -> anyhow::Result<ReportArgs> {
    let mut out = ReportArgs::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--days" => {
                let value = iter.next().ok_or_else(|| anyhow!("--days needs a value"))?;
                let days: i64 = value
                    .parse()
                    .with_context(|| format!("invalid --days value: {}", value))?;
                if days <= 0 {
                    bail!("--days must be positive");
                }
                out.days = Some(days);
            }
            "--watchlist" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--watchlist needs a comma-separated list"))?;
                out.watchlist = value
                    .split(',')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            other => bail!("Unknown report option: {}", other),
        }
    }
    Ok(out)
}

pub fn print_batch(label: &str, report: &BatchReport) {
    println!("=== {} ===", label);
    println!("Attempted:          {}", report.attempted);
    println!("Succeeded:          {}", report.succeeded);
    println!("Failed:             {}", report.failed);
    println!("Companies linked:   {}", report.companies_linked);
    println!("Model calls:        {}", report.usage.calls);
    println!("Model failures:     {}", report.usage.failures);
}

pub async fn parse_pdfs(orchestrator: &Orchestrator) -> anyhow::Result<()> {
    let report = orchestrator.parse_unparsed().await?;
    print_batch("PDF parsing", &report);
    Ok(())
}

pub async fn backfill_companies(orchestrator: &Orchestrator) -> anyhow::Result<()> {
    let report = orchestrator.backfill_companies().await?;
    print_batch("Company backfill", &report);
    println!(
        "Companies in store: {}",
        orchestrator.companies().count_companies()?
    );
    Ok(())
}

pub fn categorize(title: &str) {
    let category = categorize_title(title);
    println!(
        "{} ({})",
        category.label,
        if category.is_noise { "noise" } else { "strategic" }
    );
}

pub fn report(orchestrator: &Orchestrator, args: &ReportArgs) -> anyhow::Result<()> {
    let now = Local::now().naive_local();
    let report = orchestrator.report(now, args.days, &args.watchlist)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn tickers(orchestrator: &Orchestrator) -> anyhow::Result<()> {
    let codes = orchestrator.registry().load()?;
    for code in &codes {
        println!("{}", code);
    }
    eprintln!("{} tickers in {}", codes.len(), orchestrator.registry().path().display());
    Ok(())
}

/// Print the full profile for a ticker, or search results for a name.
pub fn company(orchestrator: &Orchestrator, query: &str) -> anyhow::Result<()> {
    let store = orchestrator.companies();
    if let Some(profile) = store.get_company_by_ticker(query)? {
        let detail = store
            .get_company_detail(profile.id)?
            .ok_or_else(|| anyhow!("company {} vanished", profile.id))?;
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }
    let matches = store.search_companies(query)?;
    if matches.is_empty() {
        bail!("No company matches '{}'", query);
    }
    println!("{}", serde_json::to_string_pretty(&matches)?);
    Ok(())
}
