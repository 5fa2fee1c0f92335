use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::session::ScrapeReport;

/// Where serialized output goes. Fire-and-forget, nothing to roll back.
#[derive(Debug, Clone)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    pub fn from_path(path: Option<&Path>) -> Self {
        match path {
            Some(p) => OutputTarget::File(p.to_path_buf()),
            None => OutputTarget::Stdout,
        }
    }
}

/// JSON serializer for completed jobs: bare record array, or the report
/// envelope when `envelope` is set.
pub struct JsonSink {
    pub pretty: bool,
    pub envelope: bool,
}

impl JsonSink {
    pub fn write(&self, report: &ScrapeReport, target: &OutputTarget) -> Result<()> {
        let payload = if self.envelope {
            self.serialize(report)?
        } else {
            self.serialize(&report.records)?
        };

        match target {
            OutputTarget::File(path) => {
                std::fs::write(path, payload)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                log::info!("Data saved to {}", path.display());
            }
            OutputTarget::Stdout => {
                let mut stdout = std::io::stdout().lock();
                stdout
                    .write_all(payload.as_bytes())
                    .context("Failed to write to stdout")?;
                stdout.write_all(b"\n").context("Failed to write to stdout")?;
            }
        }

        Ok(())
    }

    fn serialize<T: serde::Serialize>(&self, value: &T) -> Result<String> {
        let payload = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(payload)
    }
}
