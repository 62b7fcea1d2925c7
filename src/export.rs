// ABOUTME: Export orchestrator: cache → per-meeting resolution → render → manifest
// ABOUTME: Fatal gates abort early; per-meeting failures are collected and reported

use crate::{
    api::RemoteFetcher,
    config::Config,
    manifest::Manifest,
    markup::{self, ContentElement},
    model::{Document, TranscriptTurn},
    render::{renderer_for, RenderInput, Renderer},
    snapshot::Snapshot,
    storage::{prepare_destination, set_meeting_mtime},
    util::{date_prefix, safe_filename, unique_filename},
    Error, Result,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    pub success: bool,
    pub exported: usize,
    pub skipped: usize,
    pub api_fetched: usize,
    pub errors: Vec<String>,
    pub files: Vec<String>,
    pub message: String,
}

impl Default for ExportResult {
    fn default() -> Self {
        Self {
            success: true,
            exported: 0,
            skipped: 0,
            api_fetched: 0,
            errors: Vec::new(),
            files: Vec::new(),
            message: String::new(),
        }
    }
}

impl ExportResult {
    fn failed(error: &Error) -> Self {
        Self {
            success: false,
            message: error.to_string(),
            ..Self::default()
        }
    }

    fn finalize(&mut self) {
        if !self.errors.is_empty() {
            self.success = false;
            self.message = format!(
                "Exported {} with {} error(s)",
                self.exported,
                self.errors.len()
            );
        } else if self.exported > 0 {
            self.message = format!("Exported {} new meeting(s)", self.exported);
        } else {
            self.message = "Nothing new to export".into();
        }
    }
}

/// Where a piece of meeting content came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<T> {
    Local(T),
    Remote(T),
    Absent,
}

impl<T> Resolved<T> {
    pub fn is_remote(&self) -> bool {
        matches!(self, Resolved::Remote(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Resolved::Local(value) | Resolved::Remote(value) => Some(value),
            Resolved::Absent => None,
        }
    }
}

pub struct Exporter<'a> {
    config: &'a Config,
    remote: Option<(&'a dyn RemoteFetcher, String)>,
    renderer: Box<dyn Renderer>,
}

impl<'a> Exporter<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            remote: None,
            renderer: renderer_for(config.format),
        }
    }

    /// Enables remote fallback; without a credential the fetcher is never called.
    pub fn with_remote(mut self, fetcher: &'a dyn RemoteFetcher, credential: Option<String>) -> Self {
        self.remote = credential.map(|token| (fetcher, token));
        self
    }

    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Runs a full export. Never panics or returns early with an error:
    /// every outcome is described by the returned result.
    pub fn run(&self) -> ExportResult {
        match self.try_run() {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "export aborted");
                ExportResult::failed(&e)
            }
        }
    }

    fn try_run(&self) -> Result<ExportResult> {
        let dest = &self.config.destination;
        prepare_destination(dest)?;

        let snapshot = Snapshot::load(
            self.config.snapshot_path.as_deref(),
            &self.config.snapshot_dir,
        )?;

        let mut result = ExportResult::default();
        if snapshot.documents.is_empty() {
            result.message = "No meetings found in Granola cache.".into();
            return Ok(result);
        }

        let mut manifest = Manifest::load(&self.config.manifest_path)?;
        let candidates = self.candidates(&snapshot);

        let pb = if self.config.progress {
            ProgressBar::new(candidates.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_bar().template("[{bar:40}] {pos}/{len} meetings") {
            pb.set_style(style.progress_chars("##-"));
        }

        for (doc_id, doc) in candidates {
            self.export_one(&snapshot, &mut manifest, &mut result, doc_id, doc);
            pb.inc(1);
        }
        pb.finish_and_clear();

        if let Err(e) = manifest.save(&self.config.manifest_path) {
            warn!(error = %e, "failed to save manifest");
            result.errors.push(format!("manifest: {}", e));
        }

        result.finalize();
        info!(
            exported = result.exported,
            skipped = result.skipped,
            api_fetched = result.api_fetched,
            errors = result.errors.len(),
            "export finished"
        );
        Ok(result)
    }

    /// Documents to consider, oldest first. Requested ids missing from the cache are ignored.
    fn candidates<'s>(&self, snapshot: &'s Snapshot) -> Vec<(&'s str, &'s Document)> {
        let mut docs: Vec<(&str, &Document)> = match &self.config.ids {
            Some(ids) => ids
                .iter()
                .filter_map(|id| {
                    let (key, doc) = snapshot.documents.get_key_value(id.as_str())?;
                    Some((key.as_str(), doc))
                })
                .collect(),
            None => snapshot
                .documents
                .iter()
                .map(|(id, doc)| (id.as_str(), doc))
                .collect(),
        };
        docs.sort_by(|a, b| a.1.created_at().cmp(b.1.created_at()).then(a.0.cmp(b.0)));
        docs.dedup_by(|a, b| a.0 == b.0);
        docs
    }

    fn export_one(
        &self,
        snapshot: &Snapshot,
        manifest: &mut Manifest,
        result: &mut ExportResult,
        doc_id: &str,
        doc: &Document,
    ) {
        if manifest.contains(doc_id) && !self.config.force {
            debug!(doc_id, "already exported");
            result.skipped += 1;
            return;
        }

        let summary = self.resolve_summary(snapshot, doc_id);
        let transcript = self.resolve_transcript(snapshot, doc_id);
        if transcript.is_remote() {
            result.api_fetched += 1;
        }

        let elements: Vec<ContentElement> = summary
            .into_option()
            .map(|markup| markup::parse(&markup))
            .unwrap_or_default();
        let transcript = transcript.into_option().unwrap_or_default();
        let notes = doc.notes();

        let has_speech = transcript.iter().any(TranscriptTurn::is_spoken);
        if elements.is_empty() && !has_speech && notes.trim().is_empty() {
            debug!(doc_id, "nothing to export");
            result.skipped += 1;
            return;
        }

        let dest = &self.config.destination;
        let base_name = format!(
            "{} - {}",
            date_prefix(doc.created_at()),
            safe_filename(doc.title())
        );
        let filename = unique_filename(dest, &base_name, self.renderer.format().extension());
        let path = dest.join(&filename);

        let attendees = snapshot.attendees(doc_id);
        let input = RenderInput {
            doc_id,
            title: doc.title(),
            created_at: doc.created_at(),
            attendees: &attendees,
            elements: &elements,
            notes,
            transcript: &transcript,
        };

        match self.renderer.render_to(&path, &input) {
            Ok(()) => {
                if let Err(e) = set_meeting_mtime(&path, doc.created_at()) {
                    debug!(doc_id, error = %e, "could not set file time");
                }
                manifest.record(doc_id, &filename);
                result.exported += 1;
                info!(doc_id, file = %filename, "exported");
                result.files.push(filename);
            }
            Err(e) => {
                warn!(doc_id, file = %filename, error = %e, "render failed");
                result.errors.push(format!("{}: {}", filename, e));
            }
        }
    }

    fn resolve_summary(&self, snapshot: &Snapshot, doc_id: &str) -> Resolved<String> {
        if let Some(markup) = snapshot.summary_markup(doc_id) {
            return Resolved::Local(markup.to_string());
        }
        let Some((fetcher, token)) = &self.remote else {
            return Resolved::Absent;
        };
        debug!(doc_id, "summary missing locally, asking API");
        fetcher
            .fetch_panels(doc_id, token)
            .and_then(|panels| {
                panels
                    .iter()
                    .find_map(|panel| panel.summary_markup())
                    .map(str::to_string)
            })
            .map_or(Resolved::Absent, Resolved::Remote)
    }

    fn resolve_transcript(&self, snapshot: &Snapshot, doc_id: &str) -> Resolved<Vec<TranscriptTurn>> {
        let local = snapshot.transcript(doc_id);
        if local.iter().any(TranscriptTurn::is_spoken) {
            return Resolved::Local(local.to_vec());
        }
        let Some((fetcher, token)) = &self.remote else {
            return Resolved::Absent;
        };
        debug!(doc_id, "transcript missing locally, asking API");
        match fetcher.fetch_transcript(doc_id, token) {
            Some(turns) if turns.iter().any(TranscriptTurn::is_spoken) => Resolved::Remote(turns),
            _ => Resolved::Absent,
        }
    }
}
