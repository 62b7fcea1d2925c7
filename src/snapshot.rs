// ABOUTME: Reads Granola's local cache file into typed maps
// ABOUTME: Copies before parsing and normalizes string-encoded vs nested payloads

use crate::manifest::Manifest;
use crate::model::{Attendee, Document, MeetingMetadata, Panel, TranscriptTurn};
use crate::util::parse_instant;
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const WRAPPER_KEY: &str = "cache";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub documents: BTreeMap<String, Document>,
    pub transcripts: BTreeMap<String, Vec<TranscriptTurn>>,
    pub panels: BTreeMap<String, BTreeMap<String, Panel>>,
    pub meeting_metadata: BTreeMap<String, MeetingMetadata>,
}

impl Snapshot {
    /// Loads from `explicit` when it exists, else the newest `cache-v*.json` in `search_dir`.
    pub fn load(explicit: Option<&Path>, search_dir: &Path) -> Result<Self> {
        let path = locate(explicit, search_dir)?;
        debug!(path = %path.display(), "reading cache");
        Self::load_copy(&path)
    }

    /// Parses a point-in-time copy; the copy is removed when this returns.
    pub fn load_copy(path: &Path) -> Result<Self> {
        let tmp = tempfile::Builder::new()
            .prefix("granola-cache-")
            .suffix(".json")
            .tempfile()?;

        fs::copy(path, tmp.path()).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::SnapshotNotFound(path.display().to_string()),
            _ => Error::SnapshotCorrupt(format!("could not copy {}: {}", path.display(), e)),
        })?;

        let content = fs::read_to_string(tmp.path())
            .map_err(|e| Error::SnapshotCorrupt(format!("{}: {}", path.display(), e)))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(content)
            .map_err(|e| Error::SnapshotCorrupt(format!("invalid JSON: {}", e)))?;

        let wrapped = raw
            .get(WRAPPER_KEY)
            .ok_or_else(|| Error::SnapshotCorrupt(format!("missing `{}` key", WRAPPER_KEY)))?;

        // v3 stores the payload as a JSON string, v4+ as a nested object
        let payload = match wrapped {
            Value::String(encoded) => serde_json::from_str(encoded).map_err(|e| {
                Error::SnapshotCorrupt(format!("invalid encoded `{}` payload: {}", WRAPPER_KEY, e))
            })?,
            other => other.clone(),
        };

        let state = payload
            .get("state")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::SnapshotCorrupt("missing `state` object".into()))?;

        let snapshot = Snapshot {
            documents: typed_map(state, "documents"),
            transcripts: object(state, "transcripts")
                .map(|m| {
                    m.iter()
                        .filter_map(|(id, turns)| {
                            let turns = turns.as_array()?;
                            Some((id.clone(), typed_list(turns)))
                        })
                        .collect()
                })
                .unwrap_or_default(),
            panels: object(state, "documentPanels")
                .map(|m| {
                    m.iter()
                        .filter_map(|(id, panels)| {
                            let panels = panels.as_object()?;
                            Some((id.clone(), typed_entries(panels)))
                        })
                        .collect()
                })
                .unwrap_or_default(),
            meeting_metadata: object(state, "meetingsMetadata")
                .map(|m| {
                    m.iter()
                        .map(|(id, meta)| (id.clone(), MeetingMetadata::from_value(meta)))
                        .collect()
                })
                .unwrap_or_default(),
        };

        debug!(
            documents = snapshot.documents.len(),
            transcripts = snapshot.transcripts.len(),
            panels = snapshot.panels.len(),
            "parsed cache"
        );
        Ok(snapshot)
    }

    pub fn transcript(&self, doc_id: &str) -> &[TranscriptTurn] {
        self.transcripts
            .get(doc_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Markup of the first non-empty panel titled "Summary".
    pub fn summary_markup(&self, doc_id: &str) -> Option<&str> {
        self.panels
            .get(doc_id)?
            .values()
            .find_map(|panel| panel.summary_markup())
    }

    pub fn attendees(&self, doc_id: &str) -> Vec<Attendee> {
        self.meeting_metadata
            .get(doc_id)
            .map(MeetingMetadata::all_attendees)
            .unwrap_or_default()
    }

    /// One overview per document, most recent first.
    pub fn meetings(&self, manifest: &Manifest) -> Vec<MeetingOverview> {
        let mut meetings: Vec<_> = self
            .documents
            .iter()
            .map(|(id, doc)| {
                let transcript = self.transcript(id);
                let export = manifest.get(id);
                MeetingOverview {
                    doc_id: id.clone(),
                    title: doc.title().to_string(),
                    created_at: doc.created_at().to_string(),
                    attendees: self.attendees(id).into_iter().map(|a| a.name).collect(),
                    duration_seconds: duration_seconds(transcript),
                    has_transcript: !transcript.is_empty(),
                    has_summary: self.summary_markup(id).is_some(),
                    has_notes: !doc.notes().trim().is_empty(),
                    is_exported: export.is_some(),
                    export_filename: export.map(|e| e.filename.clone()),
                }
            })
            .collect();

        meetings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        meetings
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MeetingOverview {
    pub doc_id: String,
    pub title: String,
    pub created_at: String,
    pub attendees: Vec<String>,
    pub duration_seconds: Option<i64>,
    pub has_transcript: bool,
    pub has_summary: bool,
    pub has_notes: bool,
    pub is_exported: bool,
    pub export_filename: Option<String>,
}

/// Seconds between the earliest and latest parseable turn timestamps.
pub fn duration_seconds(turns: &[TranscriptTurn]) -> Option<i64> {
    let mut stamps: Vec<_> = turns
        .iter()
        .filter_map(|t| t.start_timestamp.as_deref().and_then(parse_instant))
        .collect();
    if stamps.len() < 2 {
        return None;
    }
    stamps.sort();
    let first = stamps.first()?;
    let last = stamps.last()?;
    Some((*last - *first).num_seconds())
}

/// Resolves the cache file: the explicit path if it exists, else discovery.
pub fn locate(explicit: Option<&Path>, search_dir: &Path) -> Result<PathBuf> {
    if let Some(path) = explicit.filter(|p| p.is_file()) {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = explicit {
        debug!(path = %path.display(), "configured cache path missing, searching");
    }
    find_latest_cache(search_dir).ok_or_else(|| {
        Error::SnapshotNotFound(format!(
            "no cache-v*.json in {}",
            search_dir.display()
        ))
    })
}

/// Newest `cache-v<N>.json` by numeric version.
pub fn find_latest_cache(dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name();
            let version = cache_version(name.to_str()?)?;
            Some((version, entry.path()))
        })
        .max_by_key(|(version, _)| *version)
        .map(|(_, path)| path)
}

fn cache_version(filename: &str) -> Option<u32> {
    filename
        .strip_prefix("cache-v")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

fn object<'a>(state: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    state.get(key).and_then(Value::as_object)
}

fn typed_map<T: DeserializeOwned>(state: &Map<String, Value>, key: &str) -> BTreeMap<String, T> {
    object(state, key).map(typed_entries).unwrap_or_default()
}

fn typed_entries<T: DeserializeOwned>(map: &Map<String, Value>) -> BTreeMap<String, T> {
    map.iter()
        .filter_map(|(id, value)| match serde_json::from_value(value.clone()) {
            Ok(parsed) => Some((id.clone(), parsed)),
            Err(e) => {
                warn!(id = %id, error = %e, "skipping malformed cache entry");
                None
            }
        })
        .collect()
}

fn typed_list<T: DeserializeOwned>(values: &[Value]) -> Vec<T> {
    values
        .iter()
        .filter_map(|value| serde_json::from_value(value.clone()).ok())
        .collect()
}
