// ABOUTME: Filesystem layer with atomic writes and destination checks
// ABOUTME: Handles write probes, permissions, and export file timestamps

use crate::{util::parse_instant, Error, Result};
use filetime::FileTime;
use std::fs;
use std::path::Path;
use tracing::debug;

const PROBE_FILENAME: &str = ".granola_export_probe";

/// Writes through a sibling temp file and renames it into place.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    use rand::Rng;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let random: u32 = rand::thread_rng().gen();
    let tmp_path = parent.join(format!(".{:x}.part", random));

    fs::write(&tmp_path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(&tmp_path, perms)?;
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    Ok(())
}

/// Makes sure the export directory exists and accepts writes.
///
/// A missing directory is created only when its parent already exists, so an
/// unmounted cloud drive is reported instead of silently recreated locally.
pub fn prepare_destination(dest: &Path) -> Result<()> {
    if dest.as_os_str().is_empty() {
        return Err(Error::Destination(
            "destination is not configured. Set `destination` in config or pass --destination"
                .into(),
        ));
    }

    if !dest.is_dir() {
        let parent = dest.parent().filter(|p| !p.as_os_str().is_empty());
        match parent {
            Some(parent) if parent.is_dir() => {
                fs::create_dir_all(dest).map_err(|e| {
                    Error::Destination(format!("could not create {}: {}", dest.display(), e))
                })?;
                debug!(path = %dest.display(), "created destination directory");
            }
            _ => {
                return Err(Error::Destination(format!(
                    "parent folder not found for {}. Is the drive mounted?",
                    dest.display()
                )));
            }
        }
    }

    let probe = dest.join(PROBE_FILENAME);
    fs::write(&probe, b"export check")
        .and_then(|_| fs::remove_file(&probe))
        .map_err(|e| {
            Error::Destination(format!("{} is not writable: {}", dest.display(), e))
        })?;

    Ok(())
}

/// Stamps the file's mtime with the meeting's creation instant.
pub fn set_meeting_mtime(path: &Path, created_at: &str) -> Result<()> {
    if let Some(instant) = parse_instant(created_at) {
        let mtime = FileTime::from_unix_time(instant.timestamp(), 0);
        filetime::set_file_mtime(path, mtime)?;
    }
    Ok(())
}
