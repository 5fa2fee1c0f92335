// Scrollsnap
//
// Drives a headless browser against an infinite-scroll page, waits for the
// lazy-loaded content to stop growing, then extracts one structured record
// per matching element into a uniform JSON collection.

pub mod config;
pub mod dom;
pub mod extractor;
pub mod session;
pub mod sink;
pub mod snapshot;
pub mod stabilizer;
pub mod webdriver;

// Re-export main types for convenience
pub use config::{Accessor, FieldRule, JobConfig};
pub use dom::{DomElement, DomPage};
pub use extractor::{Record, extract, map_fields};
pub use session::{ScrapeReport, run, scrape_live, scrape_snapshot};
pub use sink::{JsonSink, OutputTarget};
pub use snapshot::SnapshotPage;
pub use stabilizer::{StabilizeOutcome, stabilize};
pub use webdriver::BrowserPage;
