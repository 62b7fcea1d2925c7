// ABOUTME: Command-line interface definitions using clap
// ABOUTME: Global flags override values loaded from the config file

use crate::config::{Config, ExportFormat};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "granola-export")]
#[command(about = "Export Granola meetings to Word, Markdown, or text files", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory that receives exported files
    #[arg(short, long, global = true)]
    pub destination: Option<PathBuf>,

    /// Granola cache file (skips discovery)
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// Export manifest location
    #[arg(long, global = true)]
    pub manifest: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub format: Option<ExportFormat>,

    /// Granola session file holding API tokens
    #[arg(long, global = true)]
    pub auth_path: Option<PathBuf>,

    /// API base URL
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Bearer token (overrides session/env)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Show a progress bar while exporting
    #[arg(long, global = true)]
    pub progress: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Export meetings not yet in the manifest (default)
    Export {
        /// Re-export meetings that were already exported
        #[arg(long)]
        force: bool,

        /// Only export these document ids (comma separated)
        #[arg(long, value_delimiter = ',')]
        ids: Option<Vec<String>>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List meetings in the Granola cache
    List {
        /// Print meetings as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Export {
            force: false,
            ids: None,
            json: false,
        })
    }

    /// Layers flags given on the command line over `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(dest) = &self.destination {
            config.destination = dest.clone();
        }
        if let Some(snapshot) = &self.snapshot {
            config.snapshot_path = Some(snapshot.clone());
        }
        if let Some(manifest) = &self.manifest {
            config.manifest_path = manifest.clone();
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(auth_path) = &self.auth_path {
            config.auth_path = auth_path.clone();
        }
        if let Some(api_base) = &self.api_base {
            config.api_base = api_base.clone();
        }
        if let Some(token) = &self.token {
            config.token = Some(token.clone());
        }
        if self.progress {
            config.progress = true;
        }

        if let Commands::Export { force, ids, .. } = self.command() {
            config.force |= force;
            if let Some(ids) = ids {
                let ids: Vec<String> = ids
                    .iter()
                    .map(|id| id.trim().to_string())
                    .filter(|id| !id.is_empty())
                    .collect();
                config.ids = Some(ids);
            }
        }
    }
}
