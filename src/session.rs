use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::time::sleep;

use crate::config::JobConfig;
use crate::dom::DomPage;
use crate::extractor::{Record, extract};
use crate::snapshot::SnapshotPage;
use crate::stabilizer::stabilize;
use crate::webdriver::BrowserPage;

/// Envelope for one completed job. Zero records with `Ok` means the page
/// rendered but nothing matched; failed navigation produces no report.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeReport {
    pub started_at: String,
    pub url: String,
    pub total_records: usize,
    pub probes: usize,
    pub final_height: u64,
    pub elapsed_seconds: u64,
    pub records: Vec<Record>,
}

/// Best-effort wait for the collection selector; the scroll loop runs either way.
async fn wait_for_content<P: DomPage>(page: &P, selector: &str, timeout: Duration) -> bool {
    const POLL_INTERVAL: Duration = Duration::from_millis(500);
    let deadline = Instant::now() + timeout;

    loop {
        match page.count_matching(selector).await {
            Ok(n) if n > 0 => return true,
            Ok(_) => {}
            Err(e) => log::warn!("Presence probe failed: {}", e),
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(POLL_INTERVAL.min(timeout)).await;
    }
}

/// Run the stabilize-then-extract pipeline against an already-navigated page.
pub async fn run<P: DomPage>(page: &P, config: &JobConfig) -> Result<ScrapeReport> {
    let started_at = Local::now().to_rfc3339();
    let clock = Instant::now();

    if wait_for_content(page, &config.collection_selector, config.initial_wait()).await {
        log::info!("Initial elements loaded for {}", config.collection_selector);
    } else {
        log::warn!(
            "Initial elements {} not found within {}ms, scrolling anyway",
            config.collection_selector,
            config.initial_wait_ms
        );
    }

    let outcome = stabilize(
        page,
        &config.collection_selector,
        config.probe_interval(),
        config.max_stall,
    )
    .await?;

    // Convergence can be declared one tick before a final in-flight response
    // lands; give the page a fixed settle window before the single pass.
    sleep(config.settle()).await;

    let records = extract(page, &config.collection_selector, &config.fields).await?;

    Ok(ScrapeReport {
        started_at,
        url: config.url.clone(),
        total_records: records.len(),
        probes: outcome.probes,
        final_height: outcome.final_height,
        elapsed_seconds: clock.elapsed().as_secs(),
        records,
    })
}

/// Full live job: session bootstrap, navigation, pipeline, teardown.
pub async fn scrape_live(
    config: &JobConfig,
    webdriver_url: &str,
    headless: bool,
) -> Result<ScrapeReport> {
    let page = BrowserPage::connect(webdriver_url, headless).await?;

    let result = async {
        page.navigate(&config.url).await?;
        run(&page, config).await
    }
    .await;

    if let Err(e) = page.quit().await {
        log::warn!("Failed to close browser session: {}", e);
    }

    result
}

/// Offline job against a saved page; nothing lazy-loads, so the stabilizer
/// and settle delay are skipped.
pub async fn scrape_snapshot(config: &JobConfig, path: &Path) -> Result<ScrapeReport> {
    let started_at = Local::now().to_rfc3339();
    let clock = Instant::now();

    let page = SnapshotPage::from_file(path, Some(config.url.as_str()))
        .with_context(|| format!("Failed to load snapshot {}", path.display()))?;

    let height = page.current_scroll_height().await?;
    let records = extract(&page, &config.collection_selector, &config.fields).await?;

    Ok(ScrapeReport {
        started_at,
        url: config.url.clone(),
        total_records: records.len(),
        probes: 0,
        final_height: height,
        elapsed_seconds: clock.elapsed().as_secs(),
        records,
    })
}
