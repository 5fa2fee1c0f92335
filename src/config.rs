use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How a field value is read from the element located by the rule's selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Accessor {
    /// Trimmed inner text. Empty after trimming counts as missing.
    Text,
    /// Named attribute, read verbatim without trimming.
    Attribute { name: String },
    /// Named URL property, resolved against the document base URL.
    ResolvedUrl { name: String },
}

impl Default for Accessor {
    fn default() -> Self {
        Accessor::Text
    }
}

/// One declarative extraction rule for a card's substructure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRule {
    pub name: String,
    pub selector: String,
    #[serde(default)]
    pub accessor: Accessor,
    #[serde(default = "default_fallback")]
    pub fallback: String,
}

fn default_fallback() -> String {
    "N/A".to_string()
}

/// A complete scrape job: target, schema, and the timing knobs of the
/// scroll-convergence loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub url: String,
    pub collection_selector: String,
    pub fields: Vec<FieldRule>,
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,
    #[serde(default = "default_max_stall")]
    pub max_stall: u32,
    #[serde(default = "default_initial_wait_ms")]
    pub initial_wait_ms: u64,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    /// Output file; `None` writes to stdout.
    #[serde(default)]
    pub output: Option<PathBuf>,
}

fn default_probe_interval_ms() -> u64 {
    2000
}

fn default_max_stall() -> u32 {
    5
}

fn default_initial_wait_ms() -> u64 {
    50_000
}

fn default_settle_ms() -> u64 {
    3000
}

impl JobConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read job config {}", path.display()))?;
        let config: JobConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse job config {}", path.display()))?;

        if config.fields.is_empty() {
            anyhow::bail!("Job config {} declares no fields", path.display());
        }

        Ok(config)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    pub fn initial_wait(&self) -> Duration {
        Duration::from_millis(self.initial_wait_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}
