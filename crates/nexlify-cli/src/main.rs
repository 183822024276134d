//! Nexlify CLI - HTTP API server and one-shot converter

mod api;
mod config;

use clap::{Parser, Subcommand};
use config::{ConvertArgs, ServeArgs};
use nexlify::FileStore;
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Nexlify - convert web pages to Markdown files
#[derive(Parser, Debug)]
#[command(name = "nexlify")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve(ServeArgs),
    /// Convert URLs into the storage directory and print the report as JSON
    Convert(ConvertArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let result = match cli.command {
        Commands::Serve(args) => run_serve(args).await,
        Commands::Convert(args) => run_convert(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run_serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileStore::new(&args.storage_dir);
    let orchestrator = Arc::new(args.crawler.orchestrator(store)?);

    tracing::info!(
        storage_dir = %args.storage_dir.display(),
        cors_origins = ?args.cors_origins,
        "starting server"
    );

    api::start_server(orchestrator, args.bind, &args.cors_origins, args.retention()).await?;
    Ok(())
}

async fn run_convert(args: ConvertArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileStore::new(&args.storage_dir);
    let orchestrator = args.crawler.orchestrator(store)?;

    let report = orchestrator.run(&args.request()).await?;
    let json = serde_json::to_string_pretty(&report)?;
    writeln_safe(&json);
    Ok(())
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}
