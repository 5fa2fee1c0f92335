use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use scrollsnap::config::JobConfig;
use scrollsnap::session::{scrape_live, scrape_snapshot};
use scrollsnap::sink::{JsonSink, OutputTarget};

#[derive(Parser, Debug)]
#[command(name = "scrollsnap", version, about = "Snapshot infinite-scroll listings as structured JSON")]
struct Cli {
    /// Job definition (TOML): target URL, selectors, field rules, timing.
    #[arg(long, short = 'c')]
    config: PathBuf,

    /// Override the job's target URL.
    #[arg(long)]
    url: Option<String>,

    /// Override the job's output file (default from config; stdout if unset).
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// WebDriver endpoint to drive the browser through.
    #[arg(long, default_value = "http://localhost:9515")]
    webdriver: String,

    /// Extract from a saved HTML file instead of driving a browser.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Run with a visible browser window.
    #[arg(long)]
    headed: bool,

    /// Emit compact JSON instead of pretty-printed.
    #[arg(long)]
    compact: bool,

    /// Wrap the records in a report envelope with run metadata.
    #[arg(long)]
    report: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();

    let mut config = JobConfig::load(&cli.config)?;
    if let Some(url) = cli.url {
        config.url = url;
    }
    if let Some(output) = cli.output {
        config.output = Some(output);
    }

    log::info!("🚀 Starting scrollsnap");
    log::info!("🎯 Target: {}", config.url);

    let report = match &cli.snapshot {
        Some(path) => {
            log::info!("📄 Extracting from snapshot {}", path.display());
            scrape_snapshot(&config, path).await?
        }
        None => scrape_live(&config, &cli.webdriver, !cli.headed).await?,
    };

    log::info!(
        "Total records scraped: {} ({} probes, final height {})",
        report.total_records,
        report.probes,
        report.final_height
    );

    let sink = JsonSink {
        pretty: !cli.compact,
        envelope: cli.report,
    };
    sink.write(&report, &OutputTarget::from_path(config.output.as_deref()))?;

    Ok(())
}
