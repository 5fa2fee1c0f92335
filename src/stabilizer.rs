use anyhow::Result;
use std::time::Duration;
use tokio::time::sleep;

use crate::dom::DomPage;

/// What the convergence loop observed before it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilizeOutcome {
    pub final_height: u64,
    pub probes: usize,
}

/// Scroll until the document height stalls for `max_stall` consecutive probes.
pub async fn stabilize<P: DomPage>(
    page: &P,
    collection_selector: &str,
    probe_interval: Duration,
    max_stall: u32,
) -> Result<StabilizeOutcome> {
    log::info!("Starting auto-scroll, stall ceiling {}", max_stall);

    // Lazy loaders react to scroll-position events, not height queries, so
    // every probe re-asserts max scroll even when no growth was seen. Only
    // growth resets the stall counter. A page that grows forever scrolls
    // forever; the stall ceiling is the only bound.
    let mut last_height: u64 = 0;
    let mut stall_count: u32 = 0;
    let mut probes: usize = 0;

    while stall_count < max_stall {
        let height = page.current_scroll_height().await?;
        probes += 1;

        if height == last_height {
            stall_count += 1;
            log::info!("No new content loaded, attempt {}/{}", stall_count, max_stall);
            // Content triggered by the previous scroll may still be in
            // flight; give it one more interval before re-measuring.
            sleep(probe_interval).await;
        } else {
            stall_count = 0;
            let matching = page.count_matching(collection_selector).await?;
            log::info!("New content found, {} matching elements so far", matching);
        }

        last_height = height;
        page.scroll_to_bottom().await?;
        sleep(probe_interval).await;
    }

    log::info!(
        "Scrolling converged after {} probes at height {}",
        probes,
        last_height
    );

    Ok(StabilizeOutcome {
        final_height: last_height,
        probes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::fake::FakePage;

    const NO_WAIT: Duration = Duration::ZERO;

    #[tokio::test]
    async fn test_converges_after_stall_ceiling() {
        // Five equal readings, growth, then six equal readings: the counter
        // must reset at the growth step and terminate on the 11th reading.
        let page = FakePage::with_heights(&[100, 100, 100, 100, 100, 200, 200, 200, 200, 200, 200]);

        let outcome = stabilize(&page, ".card", NO_WAIT, 5).await.unwrap();

        assert_eq!(outcome.probes, 11);
        assert_eq!(outcome.final_height, 200);
        assert_eq!(page.height_reads.get(), 11);
    }

    #[tokio::test]
    async fn test_immediate_plateau() {
        // First reading counts as growth (from the zero baseline), then the
        // page never grows again.
        let page = FakePage::with_heights(&[50]);

        let outcome = stabilize(&page, ".card", NO_WAIT, 5).await.unwrap();

        assert_eq!(outcome.probes, 6);
        assert_eq!(outcome.final_height, 50);
    }

    #[tokio::test]
    async fn test_scroll_reasserted_every_probe() {
        let page = FakePage::with_heights(&[100, 100, 300, 300, 300]);

        let outcome = stabilize(&page, ".card", NO_WAIT, 2).await.unwrap();

        // Measure-then-scroll runs on stalled probes too.
        assert_eq!(page.scroll_commands.get(), outcome.probes);
    }

    #[tokio::test]
    async fn test_ceiling_holds_after_long_growth() {
        // A page that grows for a thousand probes before plateauing still
        // terminates once the ceiling is reached.
        let heights: Vec<u64> = (1..=1000).map(|i| i * 10).collect();
        let page = FakePage::with_heights(&heights);

        let outcome = stabilize(&page, ".card", NO_WAIT, 5).await.unwrap();

        assert_eq!(outcome.probes, 1005);
        assert_eq!(outcome.final_height, 10_000);
    }
}
