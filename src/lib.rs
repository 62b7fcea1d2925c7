// ABOUTME: Public library API for granola-export
// ABOUTME: Re-exports core modules for the binary and integration tests

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod manifest;
pub mod markup;
pub mod model;
pub mod render;
pub mod snapshot;
pub mod storage;
pub mod util;

pub use error::{Error, Result};
pub use export::{ExportResult, Exporter};
pub use model::Frontmatter;
