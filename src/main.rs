//! `senti` command-line interface.
//!
//! Subcommands mirror an operator's workflow: verify the store
//! (`connect`), pick a target (`use`), check the model artifacts
//! (`check`), run a session (`stream`), then inspect what landed
//! (`stats`, `db`). `keywords` prints the recent-keyword history.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sentistream::classifier::TrainedScorers;
use sentistream::config::{load_config, Config};
use sentistream::error::Error;
use sentistream::recents::StateFiles;
use sentistream::report::run_stats;
use sentistream::session::SessionController;
use sentistream::source::{HttpSource, ReplaySource, StreamSource};
use sentistream::store::{
    self, validate_collection_name, validate_database_name,
};

#[derive(Parser)]
#[command(name = "senti", version, about = "Stream sentiment ingestion")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, default_value = "config/senti.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a document store with a write probe and remember it.
    Connect {
        /// Store host; falls back to the last session's host.
        host: Option<String>,
        /// Store port; falls back to the last session's port.
        port: Option<String>,
    },
    /// Choose the database and collection records are written to.
    Use {
        database: String,
        collection: String,
    },
    /// Check that the trained model artifacts are in place.
    Check,
    /// Open a keyword-filtered stream session.
    Stream {
        /// Keywords to track.
        keywords: Vec<String>,
        /// Score a capture file instead of the live endpoint.
        #[arg(long)]
        replay: Option<PathBuf>,
        /// Override the remembered database.
        #[arg(long)]
        database: Option<String>,
        /// Override the remembered collection.
        #[arg(long)]
        collection: Option<String>,
    },
    /// Per-label counts for a stored collection.
    Stats {
        #[arg(long)]
        database: Option<String>,
        #[arg(long)]
        collection: Option<String>,
    },
    /// Inspect or prune the document store.
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Print the recent-keyword history.
    Keywords,
}

#[derive(Subcommand)]
enum DbCommands {
    /// List databases.
    Databases,
    /// List collections in a database.
    Collections { database: String },
    /// Drop a database and everything in it.
    DropDatabase { name: String },
    /// Drop one collection.
    DropCollection { database: String, name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let files = StateFiles::new(&config.files.dir);

    match cli.command {
        Commands::Connect { host, port } => connect(&config, &files, host, port).await,
        Commands::Use {
            database,
            collection,
        } => choose_target(&files, &database, &collection),
        Commands::Check => check_artifacts(&config),
        Commands::Stream {
            keywords,
            replay,
            database,
            collection,
        } => stream(&config, &files, keywords, replay, database, collection).await,
        Commands::Stats {
            database,
            collection,
        } => stats(&config, &files, database, collection).await,
        Commands::Db { command } => db(&config, &files, command).await,
        Commands::Keywords => keywords(&files),
    }
}

async fn connect(
    config: &Config,
    files: &StateFiles,
    host: Option<String>,
    port: Option<String>,
) -> Result<()> {
    let last = files.read_last()?;
    let host = host
        .or(last.host)
        .ok_or_else(|| anyhow!("no host given and no previous connection on record"))?;
    let port: u16 = match port {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::InvalidInput("Port must be an integer".to_string()))?,
        None => last
            .port
            .ok_or_else(|| anyhow!("no port given and no previous connection on record"))?,
    };

    let mut store_cfg = config.store.clone();
    store_cfg.host = host.clone();
    store_cfg.port = port;
    store::connect(&store_cfg).await?;
    files.record_connection(&host, port)?;
    println!("connected to {host}:{port}");
    Ok(())
}

fn choose_target(files: &StateFiles, database: &str, collection: &str) -> Result<()> {
    validate_database_name(database)?;
    validate_collection_name(collection)?;
    files.record_selection(database, collection)?;
    println!("using {database}/{collection}");
    Ok(())
}

fn check_artifacts(config: &Config) -> Result<()> {
    TrainedScorers::verify(&config.artifacts)?;
    println!("model artifacts are in place");
    println!("  polarity:     {}", config.artifacts.polarity.display());
    println!("  subjectivity: {}", config.artifacts.subjectivity.display());
    Ok(())
}

/// Resolve the target database/collection from flags, then the last
/// session, in that order.
fn resolve_target(
    files: &StateFiles,
    database: Option<String>,
    collection: Option<String>,
) -> Result<(String, String)> {
    let last = files.read_last()?;
    let database = database.or(last.database).ok_or_else(|| {
        anyhow!("no database selected; run `senti use <database> <collection>` first")
    })?;
    let collection = collection.or(last.collection).ok_or_else(|| {
        anyhow!("no collection selected; run `senti use <database> <collection>` first")
    })?;
    Ok((database, collection))
}

async fn stream(
    config: &Config,
    files: &StateFiles,
    keywords: Vec<String>,
    replay: Option<PathBuf>,
    database: Option<String>,
    collection: Option<String>,
) -> Result<()> {
    // Artifacts gate the session: fail before touching the network.
    TrainedScorers::verify(&config.artifacts)?;
    let scorers = TrainedScorers::load(&config.artifacts)?;
    let (database, collection) = resolve_target(files, database, collection)?;

    let store_cfg = config.store.clone().with_last_session(&files.read_last()?);
    let store = store::connect(&store_cfg).await?;
    let source: Box<dyn StreamSource> = if let Some(path) = replay {
        Box::new(ReplaySource::new(path))
    } else if config.stream.kind == "replay" {
        let path = config
            .stream
            .replay_path
            .clone()
            .ok_or_else(|| anyhow!("stream.replay_path is not set"))?;
        Box::new(ReplaySource::new(path))
    } else {
        Box::new(HttpSource::new(
            &config.stream.endpoint,
            &config.stream.token_env,
        ))
    };

    let mut session = SessionController::new(
        scorers,
        Arc::from(store),
        &config.stream.language,
        &database,
        &collection,
    );
    let handle = session.handle();

    let run = session.run(source.as_ref(), &keywords, files);
    tokio::pin!(run);

    let report = loop {
        tokio::select! {
            result = &mut run => break result,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, terminating stream");
                handle.stop();
            }
        }
    };

    match report {
        Ok(report) => {
            println!("stored {} records, ignored {}", report.stored, report.ignored);
            Ok(())
        }
        Err(err) => {
            error!(severity = ?err.severity(), "session ended with an error");
            Err(err.into())
        }
    }
}

async fn stats(
    config: &Config,
    files: &StateFiles,
    database: Option<String>,
    collection: Option<String>,
) -> Result<()> {
    let (database, collection) = resolve_target(files, database, collection)?;
    let store_cfg = config.store.clone().with_last_session(&files.read_last()?);
    let store = store::connect(&store_cfg).await?;
    run_stats(store.as_ref(), &database, &collection).await
}

async fn db(config: &Config, files: &StateFiles, command: DbCommands) -> Result<()> {
    let store_cfg = config.store.clone().with_last_session(&files.read_last()?);
    let store = store::connect(&store_cfg).await?;
    match command {
        DbCommands::Databases => {
            for name in store.list_databases().await? {
                println!("{name}");
            }
        }
        DbCommands::Collections { database } => {
            validate_database_name(&database)?;
            for name in store.list_collections(&database).await? {
                println!("{name}");
            }
        }
        DbCommands::DropDatabase { name } => {
            validate_database_name(&name)?;
            store.drop_database(&name).await?;
            println!("dropped database {name}");
        }
        DbCommands::DropCollection { database, name } => {
            validate_database_name(&database)?;
            validate_collection_name(&name)?;
            store.drop_collection(&database, &name).await?;
            println!("dropped collection {database}/{name}");
        }
    }
    Ok(())
}

fn keywords(files: &StateFiles) -> Result<()> {
    let keywords = files
        .read_keywords()
        .context("failed to read keyword history")?;
    if keywords.is_empty() {
        println!("no keywords on record");
        return Ok(());
    }
    for keyword in keywords {
        println!("{keyword}");
    }
    Ok(())
}
