// ABOUTME: CLI entrypoint for the granola-export command
// ABOUTME: Wires config, credentials, and the exporter; maps outcomes to exit codes

use clap::Parser;
use granola_export::{
    api::ApiClient,
    auth::resolve_credential,
    cli::{Cli, Commands},
    config::Config,
    manifest::Manifest,
    snapshot::Snapshot,
    util::date_prefix,
    ExportResult, Exporter, Result,
};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("granola-export: [E{}] {}", e.exit_code(), e);
            std::process::exit(e.exit_code());
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    match cli.command() {
        Commands::Export { json, .. } => {
            let credential = resolve_credential(config.token.as_deref(), &config.auth_path);
            let client = ApiClient::new(Some(config.api_base.clone()))?;
            let result = Exporter::new(&config)
                .with_remote(&client, credential)
                .run();

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result);
            }
            Ok(if result.success { 0 } else { 1 })
        }
        Commands::List { json } => {
            let snapshot = Snapshot::load(config.snapshot_path.as_deref(), &config.snapshot_dir)?;
            let manifest = Manifest::load(&config.manifest_path)?;
            let meetings = snapshot.meetings(&manifest);

            if json {
                println!("{}", serde_json::to_string_pretty(&meetings)?);
            } else if meetings.is_empty() {
                println!("No meetings found in Granola cache.");
            } else {
                for meeting in &meetings {
                    let mark = if meeting.is_exported { "*" } else { " " };
                    println!(
                        "{} {}  {}  ({})",
                        mark,
                        date_prefix(&meeting.created_at),
                        meeting.title,
                        meeting.doc_id
                    );
                }
            }
            Ok(0)
        }
    }
}

fn print_result(result: &ExportResult) {
    for file in &result.files {
        println!("  {}", file);
    }
    for error in &result.errors {
        eprintln!("  error: {}", error);
    }
    if result.success {
        println!("{}", result.message);
    } else {
        eprintln!("{}", result.message);
    }
}
