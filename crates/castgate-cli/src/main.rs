mod format;

use std::net::IpAddr;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use castgate_api::cast::CastClient;
use castgate_api::debrid::DebridClient;
use castgate_core::cache::LinkCache;
use castgate_core::composer::{DirectoryComposer, DirectoryKind};
use castgate_core::config::AppConfig;
use castgate_core::error::CastgateError;
use castgate_core::pipeline::{Resolution, ResolvePipeline};

#[derive(Parser)]
#[command(
    name = "castgate",
    about = "Expose debrid-hosted media as streamable virtual files"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a magnet link or bare infohash to a direct URL.
    Resolve {
        input: String,
        /// Public IP to pass upstream as a routing hint.
        #[arg(long)]
        ip: Option<IpAddr>,
    },
    /// Complete a pending file selection.
    Select {
        session_id: String,
        file_id: u64,
        #[arg(long)]
        ip: Option<IpAddr>,
    },
    /// List a virtual directory.
    Ls {
        #[arg(value_enum)]
        which: Directory,
    },
    /// Print the URL behind a virtual file.
    Cat {
        #[arg(value_enum)]
        which: Directory,
        name: String,
    },
    /// Delete a casted link by its virtual filename.
    Rm { name: String },
    /// Print a cached link's URL, refreshing it first when stale.
    Refresh { id: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Directory {
    Observed,
    Casted,
}

impl From<Directory> for DirectoryKind {
    fn from(d: Directory) -> Self {
        match d {
            Directory::Observed => DirectoryKind::Observed,
            Directory::Casted => DirectoryKind::Casted,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("castgate=info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CastgateError> {
    let config = AppConfig::load()?;
    if config.debrid.api_token.is_empty() {
        return Err(CastgateError::Config(format!(
            "no debrid api token configured; set [debrid] api_token in {}",
            AppConfig::config_path().display()
        )));
    }

    let debrid = Arc::new(DebridClient::new(config.debrid.api_token.clone()));
    let cast = Arc::new(CastClient::new(config.cast.api_token.clone()));
    let cache = Arc::new(LinkCache::open(&config)?);
    let pipeline = ResolvePipeline::new(Arc::clone(&debrid), Arc::clone(&cache));
    let composer = DirectoryComposer::new(Arc::clone(&debrid), cast, Arc::clone(&cache));

    match cli.command {
        Command::Resolve { input, ip } => match pipeline.resolve(&input, ip).await? {
            Resolution::Complete(media) => {
                println!("{} ({})", media.filename, format::bytes(media.bytes));
                println!("infohash: {}", media.infohash);
            }
            Resolution::SelectionRequired(pending) => {
                println!("{}: pick a file, then run:", pending.title);
                println!("  castgate select {} <file-id>", pending.session_id);
                for file in &pending.files {
                    let marker = if file.is_selected() { "*" } else { " " };
                    println!(
                        "  {marker} [{}] {} ({})",
                        file.id,
                        file.name(),
                        format::bytes(file.bytes)
                    );
                }
            }
        },
        Command::Select {
            session_id,
            file_id,
            ip,
        } => {
            let media = pipeline.complete_selection(&session_id, file_id, ip).await?;
            println!("{} ({})", media.filename, format::bytes(media.bytes));
        }
        Command::Ls { which } => {
            for file in composer.list(which.into()).await? {
                println!(
                    "{:>9}  {:>12}  {}",
                    format::bytes(file.size),
                    format::relative_time(&file.modified),
                    file.name
                );
            }
        }
        Command::Cat { which, name } => {
            let url = composer.resolve_virtual_file(which.into(), &name).await?;
            println!("{url}");
        }
        Command::Rm { name } => {
            composer.delete_virtual_file(&name).await?;
            println!("deleted {name}");
        }
        Command::Refresh { id } => {
            let url = composer.refresh_if_stale(&id).await?;
            println!("{url}");
        }
    }
    Ok(())
}
