// ABOUTME: Blocking HTTP client for Granola API fallback fetches
// ABOUTME: Every failure degrades to "no data" at the RemoteFetcher seam

use crate::config::DEFAULT_API_BASE;
use crate::model::{Panel, TranscriptTurn};
use crate::{Error, Result};
use reqwest::blocking::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

const CLIENT_VERSION: &str = "6.476.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of meeting content missing from the local cache.
///
/// Implementations never fail: any problem is reported as `None`.
pub trait RemoteFetcher {
    fn fetch_transcript(&self, doc_id: &str, credential: &str) -> Option<Vec<TranscriptTurn>>;
    fn fetch_panels(&self, doc_id: &str, credential: &str) -> Option<Vec<Panel>>;
}

fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.len() <= max_chars {
        return s.to_string();
    }

    // Find a valid UTF-8 boundary at or before max_chars
    let mut boundary = max_chars;
    while boundary > 0 && !s.is_char_boundary(boundary) {
        boundary -= 1;
    }

    if boundary == 0 {
        return String::new();
    }

    format!("{}...", &s[..boundary])
}

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(ApiClient {
            client,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_API_BASE.into())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    fn post<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        token: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .header("User-Agent", format!("Granola/{}", CLIENT_VERSION))
            .header("X-Client-Version", CLIENT_VERSION)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(Error::Api {
                endpoint: endpoint.into(),
                status: status.as_u16(),
                message: truncate_str(&message, 100),
            });
        }

        let body = response.text()?;
        serde_json::from_str(&body).map_err(|e| {
            debug!(
                endpoint,
                body = %truncate_str(&body, 500),
                "unexpected response body"
            );
            Error::Parse(e)
        })
    }

    pub fn get_transcript(&self, doc_id: &str, token: &str) -> Result<Vec<TranscriptTurn>> {
        self.post(
            "/get-document-transcript",
            token,
            json!({ "document_id": doc_id }),
        )
    }

    pub fn get_panels(&self, doc_id: &str, token: &str) -> Result<Vec<Panel>> {
        self.post(
            "/get-document-panels",
            token,
            json!({ "document_id": doc_id }),
        )
    }
}

impl RemoteFetcher for ApiClient {
    fn fetch_transcript(&self, doc_id: &str, credential: &str) -> Option<Vec<TranscriptTurn>> {
        match self.get_transcript(doc_id, credential) {
            Ok(turns) if !turns.is_empty() => Some(turns),
            Ok(_) => None,
            Err(e) => {
                warn!(doc_id, error = %e, "transcript fetch failed");
                None
            }
        }
    }

    fn fetch_panels(&self, doc_id: &str, credential: &str) -> Option<Vec<Panel>> {
        match self.get_panels(doc_id, credential) {
            Ok(panels) => Some(panels),
            Err(e) => {
                warn!(doc_id, error = %e, "panel fetch failed");
                None
            }
        }
    }
}
