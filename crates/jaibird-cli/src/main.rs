//! JAIBird — JSE SENS filing pipeline operator commands.

use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;

use jaibird_core::JaibirdConfig;
use jaibird_runtime::Orchestrator;

fn resolve_data_dir() -> PathBuf {
    std::env::var("JAIBIRD_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

fn print_help() {
    println!("JAIBird — JSE SENS filing pipeline");
    println!();
    println!("Usage: jaibird <command>");
    println!();
    println!("Commands:");
    println!("  parse-pdfs                     Extract and summarize unparsed filings");
    println!("  backfill-companies             Rebuild company intelligence from parsed filings");
    println!("  categorize <title>             Classify an announcement title");
    println!("  report [--days N] [--watchlist a,b]");
    println!("                                 Print analytics over stored filings as JSON");
    println!("  company <ticker|name>          Show a company profile");
    println!("  tickers                        List discovered tickers");
    println!("  help                           Show this help message");
    println!();
    println!("Environment: JAIBIRD_DATA_DIR (default ./data), RUST_LOG (default info)");
}

fn open() -> anyhow::Result<Orchestrator> {
    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());
    let config = JaibirdConfig::from_env(&data_dir)?;
    Ok(Orchestrator::open(config)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1) else {
        print_help();
        return Ok(());
    };

    match command.as_str() {
        "parse-pdfs" => commands::parse_pdfs(&open()?).await?,
        "backfill-companies" => commands::backfill_companies(&open()?).await?,
        "categorize" => {
            if args.len() < 3 {
                eprintln!("Usage: jaibird categorize <title>");
                std::process::exit(1);
            }
            commands::categorize(&args[2..].join(" "));
        }
        "report" => {
            let report_args = commands::parse_report_args(&args[2..])?;
            commands::report(&open()?, &report_args)?;
        }
        "company" => {
            if args.len() < 3 {
                eprintln!("Usage: jaibird company <ticker|name>");
                std::process::exit(1);
            }
            commands::company(&open()?, &args[2..].join(" "))?;
        }
        "tickers" => commands::tickers(&open()?)?,
        "--help" | "-h" | "help" => print_help(),
        other => {
            eprintln!("Unknown command: {}. Use 'jaibird help' for usage.", other);
            std::process::exit(1);
        }
    }

    Ok(())
}
