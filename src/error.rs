// ABOUTME: Error types with structured exit codes for CLI
// ABOUTME: Separates run-fatal, per-record, and absorbed remote failures

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Destination error: {0}")]
    Destination(String),

    #[error("Granola cache not found: {0}")]
    SnapshotNotFound(String),

    #[error("Failed to read Granola cache: {0}")]
    SnapshotCorrupt(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status} on {endpoint}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Destination(_) => 2,
            Error::SnapshotNotFound(_) => 3,
            Error::SnapshotCorrupt(_) => 4,
            Error::Render(_) => 5,
            Error::Network(_) => 6,
            Error::Api { .. } => 7,
            Error::Parse(_) => 8,
            Error::Filesystem(_) => 9,
            Error::Config(_) => 10,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::Destination("test".into()).exit_code(), 2);
        assert_eq!(
            Error::Api {
                endpoint: "test".into(),
                status: 404,
                message: "not found".into()
            }
            .exit_code(),
            7
        );
        assert_eq!(Error::Config("test".into()).exit_code(), 10);
    }
}
