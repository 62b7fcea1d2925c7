// ABOUTME: Utility functions for filenames, timestamps, and helpers
// ABOUTME: Provides collision-safe export names and consistent time formatting

use crate::model::UNTITLED;
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

pub const MAX_FILENAME_CHARS: usize = 80;
/// Leaves room within the 255-byte NAME_MAX for `YYYY-MM-DD - `, ` (NNNN)` and `.docx`.
pub const MAX_FILENAME_BYTES: usize = 200;
const MAX_COLLISION_ATTEMPTS: u32 = 100;

/// Strips characters illegal in filenames, collapses whitespace, and caps length
/// in both characters and UTF-8 bytes.
/// Always returns a non-empty name; applying it twice changes nothing.
pub fn safe_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut truncated = String::new();
    for c in collapsed.chars().take(MAX_FILENAME_CHARS) {
        if truncated.len() + c.len_utf8() > MAX_FILENAME_BYTES {
            break;
        }
        truncated.push(c);
    }
    let trimmed = truncated.trim_end();

    if trimmed.is_empty() {
        UNTITLED.to_string()
    } else {
        trimmed.to_string()
    }
}


/// Picks `base.ext`, then `base (2).ext` .. `base (99).ext`, then a hash suffix.
pub fn unique_filename(dest_dir: &Path, base_name: &str, ext: &str) -> String {
    let candidate = format!("{}{}", base_name, ext);
    if !dest_dir.join(&candidate).exists() {
        return candidate;
    }

    for i in 2..MAX_COLLISION_ATTEMPTS {
        let candidate = format!("{} ({}){}", base_name, i, ext);
        if !dest_dir.join(&candidate).exists() {
            return candidate;
        }
    }

    let mut hasher = DefaultHasher::new();
    base_name.hash(&mut hasher);
    format!("{} ({}){}", base_name, hasher.finish() % 9999, ext)
}

#[cfg(test)]
mod unique_tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_unique_filename_free() {
        let temp = TempDir::new().unwrap();
        assert_eq!(unique_filename(temp.path(), "base", ".md"), "base.md");
    }

    #[test]
    fn test_unique_filename_next_suffix() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("base.md"), "").unwrap();
        for i in 2..=4 {
            fs::write(temp.path().join(format!("base ({}).md", i)), "").unwrap();
        }
        assert_eq!(unique_filename(temp.path(), "base", ".md"), "base (5).md");
    }

    #[test]
    fn test_unique_filename_hash_fallback() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("base.txt"), "").unwrap();
        for i in 2..MAX_COLLISION_ATTEMPTS {
            fs::write(temp.path().join(format!("base ({}).txt", i)), "").unwrap();
        }
        let name = unique_filename(temp.path(), "base", ".txt");
        assert!(name.starts_with("base ("));
        assert!(name.ends_with(").txt"));
        assert_eq!(name, unique_filename(temp.path(), "base", ".txt"));
    }
}

/// Parses an ISO-8601 instant; offset-less values are read as UTC.
pub fn parse_instant(ts: &str) -> Option<DateTime<FixedOffset>> {
    let ts = ts.trim();
    DateTime::parse_from_rfc3339(ts).ok().or_else(|| {
        NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc().fixed_offset())
    })
}

/// `YYYY-MM-DD` for filenames, or `unknown-date`.
pub fn date_prefix(created_at: &str) -> String {
    parse_instant(created_at)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown-date".into())
}

/// Long date-time in the instant's own offset; the raw text when unparseable.
pub fn long_date(created_at: &str, pattern: &str) -> String {
    parse_instant(created_at)
        .map(|dt| dt.format(pattern).to_string())
        .unwrap_or_else(|| created_at.to_string())
}

/// Clock label for a transcript turn, or `placeholder` when the timestamp is unusable.
pub fn clock_label(ts: Option<&str>, with_seconds: bool, placeholder: &str) -> String {
    let pattern = if with_seconds { "%H:%M:%S" } else { "%H:%M" };
    ts.and_then(parse_instant)
        .map(|dt| dt.format(pattern).to_string())
        .unwrap_or_else(|| placeholder.to_string())
}

#[cfg(test)]
mod timestamp_tests {
    use super::*;

    #[test]
    fn test_date_prefix() {
        assert_eq!(date_prefix("2025-10-28T15:04:05Z"), "2025-10-28");
        assert_eq!(date_prefix("2025-10-28T23:30:00-05:00"), "2025-10-28");
        assert_eq!(date_prefix("2025-10-28T15:04:05.123456"), "2025-10-28");
        assert_eq!(date_prefix("yesterday"), "unknown-date");
        assert_eq!(date_prefix(""), "unknown-date");
    }

    #[test]
    fn test_long_date_fallback() {
        assert_eq!(
            long_date("2025-10-28T15:04:05Z", "%B %d, %Y at %I:%M %p"),
            "October 28, 2025 at 03:04 PM"
        );
        assert_eq!(long_date("last tuesday", "%B %d, %Y"), "last tuesday");
    }

    #[test]
    fn test_clock_label() {
        let ts = Some("2025-10-01T21:35:12.500Z");
        assert_eq!(clock_label(ts, true, "??"), "21:35:12");
        assert_eq!(clock_label(ts, false, "??"), "21:35");
        assert_eq!(clock_label(Some("garbage"), true, "??:??:??"), "??:??:??");
        assert_eq!(clock_label(None, false, "--:--"), "--:--");
    }
}
