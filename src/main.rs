mod output;

use crate::output::Entry;
use clap::{Parser, Subcommand};
use revisit_config::Config;
use revisit_discover::{Aggregator, WorkspaceReference};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "revisit", version, about = "List and reopen recently used editor and IDE workspaces")]
struct Cli {
    /// Read configuration from this file only, instead of the user config directory.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Increase log output on stderr (repeatable). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List recently used workspaces.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
        /// Show at most this many workspaces.
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
    },
    /// Open a discovered workspace in the tool that reported it.
    Open {
        /// Path or `file:` URI of the workspace.
        path: String,
    },
    /// List the supported tools and where their state is read from.
    Providers,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = ?err, retryable = err.is_retryable(), "Unable to load configuration");
            eprintln!("revisit: {err}");
            return ExitCode::FAILURE;
        },
    };
    let aggregator = Aggregator::from_config(&config);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupted; cancelling discovery");
                cancel.cancel();
            }
        }
    });

    match cli.command {
        Command::List { json, limit } => {
            let mut workspaces = aggregator.discover(&cancel).await;
            if let Some(limit) = limit {
                workspaces.truncate(limit);
            }
            list(&workspaces, json)
        },
        Command::Open { path } => {
            aggregator.discover(&cancel).await;
            match aggregator.launch(&path) {
                true => ExitCode::SUCCESS,
                false => {
                    eprintln!("revisit: unable to open {path}");
                    ExitCode::FAILURE
                },
            }
        },
        Command::Providers => {
            for provider in aggregator.providers() {
                let source = provider.source_path().map_or_else(|| "(not found)".to_string(), |p| p.display().to_string());
                let launcher = provider.launcher().resolve().map_or_else(|| "(not found)".to_string(), |p| p.display().to_string());
                println!(
                    "{}\t{}\n  icon:     {}\n  source:   {source}\n  launcher: {launcher}",
                    provider.kind(),
                    provider.display_name(),
                    provider.icon(),
                );
            }
            let enabled: Vec<_> = aggregator.providers().map(|p| p.kind()).collect();
            for disabled in revisit_discover::ProviderKind::ALL.into_iter().filter(|kind| !enabled.contains(kind)) {
                println!("{disabled}\t{} (disabled)", disabled.display_name());
            }
            ExitCode::SUCCESS
        },
    }
}

fn list(workspaces: &[WorkspaceReference], json: bool) -> ExitCode {
    let entries: Vec<Entry<'_>> = workspaces.iter().map(Entry::from).collect();
    if !json {
        print!("{}", output::table(&entries));
        return ExitCode::SUCCESS;
    }
    match output::json(&entries) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        },
        Err(err) => {
            tracing::error!(error = %err, "Unable to serialize workspaces");
            ExitCode::FAILURE
        },
    }
}
