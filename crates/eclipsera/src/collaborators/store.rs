//! Shared per-run results map.
//!
//! Collaborators record their [`ToolReport`] here while they run. Every
//! update rewrites `results.json` in the output directory, so the file on
//! disk always reflects every finished collaborator. The map is serialized
//! under the entries lock; the file itself is written after the lock is
//! released, and a snapshot older than the one already on disk is dropped.

use crate::types::ToolReport;
use crate::{EclipseraError, Result};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name of the persisted results map.
pub const RESULTS_FILE_NAME: &str = "results.json";

#[derive(Debug, Default)]
struct Entries {
    reports: BTreeMap<String, ToolReport>,
    revision: u64,
}

#[derive(Debug, Clone)]
pub struct ResultsStore {
    path: PathBuf,
    entries: Arc<Mutex<Entries>>,
    /// Revision of the snapshot last written to `path`.
    written: Arc<tokio::sync::Mutex<u64>>,
}

impl ResultsStore {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            path: output_dir.join(RESULTS_FILE_NAME),
            entries: Arc::new(Mutex::new(Entries::default())),
            written: Arc::new(tokio::sync::Mutex::new(0)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or replace the entry for `name` and persist the whole map.
    pub async fn record(&self, name: &str, report: ToolReport) -> Result<()> {
        let (json, revision) = {
            let mut entries = self.entries.lock();
            entries.reports.insert(name.to_string(), report);
            entries.revision += 1;
            let json = serde_json::to_string_pretty(&entries.reports).map_err(|e| {
                EclipseraError::serialization_with_source(format!("Failed to encode {}", RESULTS_FILE_NAME), e)
            })?;
            (json, entries.revision)
        };

        let mut written = self.written.lock().await;
        if revision > *written {
            tokio::fs::write(&self.path, json).await?;
            *written = revision;
        }
        Ok(())
    }

    /// In-memory copy of the current entries.
    pub fn snapshot(&self) -> BTreeMap<String, ToolReport> {
        self.entries.lock().reports.clone()
    }

    /// Read `results.json` from `output_dir`.
    ///
    /// A missing file is an empty map. Entries that do not parse as a
    /// [`ToolReport`] are dropped with a warning.
    pub async fn load(output_dir: &Path) -> Result<BTreeMap<String, ToolReport>> {
        let path = output_dir.join(RESULTS_FILE_NAME);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(&raw)
            .map_err(|e| EclipseraError::serialization_with_source(format!("Malformed {}", RESULTS_FILE_NAME), e))?;
        let mut results = BTreeMap::new();
        for (name, value) in raw {
            match serde_json::from_value::<ToolReport>(value) {
                Ok(report) => {
                    results.insert(name, report);
                }
                Err(e) => tracing::warn!("Ignoring malformed result entry '{}': {}", name, e),
            }
        }
        Ok(results)
    }
}
