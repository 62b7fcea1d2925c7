// ABOUTME: Bearer token discovery with precedence chain
// ABOUTME: Explicit token → Granola session file → GRANOLA_TOKEN env var

use crate::Result;
use serde_json::Value;
use std::env;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub const TOKEN_ENV_VAR: &str = "GRANOLA_TOKEN";

/// Finds a credential for remote fallback fetches. Absence is not an error:
/// the export simply runs on local data only.
pub fn resolve_credential(explicit: Option<&str>, session_path: &Path) -> Option<String> {
    // 1. Explicit token (CLI flag or config)
    if let Some(token) = explicit.filter(|t| !t.is_empty()) {
        return Some(token.to_string());
    }

    // 2. Granola session file
    match parse_session_file(session_path) {
        Ok(Some(token)) => return Some(token),
        Ok(None) => debug!(path = %session_path.display(), "no token in session file"),
        Err(e) => warn!(path = %session_path.display(), error = %e, "unreadable session file"),
    }

    // 3. Environment variable
    env::var(TOKEN_ENV_VAR).ok().filter(|t| !t.is_empty())
}

fn parse_session_file(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let json: Value = serde_json::from_str(&content)?;

    // WorkOS is the current auth provider; Cognito is the legacy one
    for key in ["workos_tokens", "cognito_tokens"] {
        if let Some(token) = json.get(key).and_then(access_token) {
            return Ok(Some(token));
        }
    }

    Ok(None)
}

/// Token blobs are stored either as stringified JSON or as a nested object.
fn access_token(tokens: &Value) -> Option<String> {
    let parsed;
    let tokens = match tokens {
        Value::String(s) => {
            parsed = serde_json::from_str::<Value>(s).ok()?;
            &parsed
        }
        other => other,
    };
    tokens
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
