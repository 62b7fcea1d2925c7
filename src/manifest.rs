// ABOUTME: Persisted ledger of exported meetings keyed by document id
// ABOUTME: Drives idempotent exports; saved atomically at the end of a run

use crate::{storage::write_atomic, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub filename: String,
    /// ISO-8601; older manifests may carry offset-less local times
    pub exported_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    /// A missing file is an empty manifest. An unreadable one is logged and
    /// treated as empty so the run can still proceed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Manifest::default());
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "manifest unreadable, starting empty");
                return Ok(Manifest::default());
            }
        };
        match serde_json::from_str(&content) {
            Ok(manifest) => Ok(manifest),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "manifest is not valid JSON, starting empty");
                Ok(Manifest::default())
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, json.as_bytes())
    }

    pub fn contains(&self, doc_id: &str) -> bool {
        self.entries.contains_key(doc_id)
    }

    pub fn get(&self, doc_id: &str) -> Option<&ManifestEntry> {
        self.entries.get(doc_id)
    }

    /// Inserts or overwrites the entry, stamped with the current time.
    pub fn record(&mut self, doc_id: &str, filename: &str) {
        self.entries.insert(
            doc_id.to_string(),
            ManifestEntry {
                filename: filename.to_string(),
                exported_at: Utc::now().to_rfc3339(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
