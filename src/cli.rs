//! Command-line entry points: the long-running service and the operator
//! commands for schema and checkpoint maintenance.

use std::sync::Arc;

use actix_web::dev::{Server, ServerHandle};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    configuration::{
        get_configuration, open_store, set_configuration, AppState, Config,
        State, StoreBackend,
    },
    dao::EntityStore,
    error::Error,
    provider::{
        DatabasePool, EndpointPool, EndpointStatus, IngestOptions, Ingestor,
        RpcFeed,
    },
    server::init_server,
};

/// Lending protocol ETL service
#[derive(Parser)]
#[command(name = "lending-etl")]
#[command(about = "Lending protocol event indexer and API", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run ingestion and the HTTP API (default if no command specified)
    Serve,

    /// Run ingestion only
    Ingest,

    /// Run the HTTP API only
    Api,

    /// Apply the database schema
    Migrate,

    /// Inspect or rewind the sync checkpoint
    Checkpoint {
        #[command(subcommand)]
        command: CheckpointCommands,
    },
}

#[derive(Subcommand)]
pub enum CheckpointCommands {
    /// Print the last fully processed block
    Show,

    /// Overwrite the checkpoint; ingestion resumes at the next block
    Set { block: i64 },
}

pub fn init_config() -> Result<Config, Error> {
    set_configuration()?;
    get_configuration()
}

pub async fn run(cli: Cli) -> Result<(), Error> {
    let config = init_config()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_service(config, true, true).await,
        Commands::Ingest => run_service(config, true, false).await,
        Commands::Api => run_service(config, false, true).await,
        Commands::Migrate => run_migrate(&config).await,
        Commands::Checkpoint { command } => match command {
            CheckpointCommands::Show => run_checkpoint_show(&config).await,
            CheckpointCommands::Set { block } => {
                run_checkpoint_set(&config, block).await
            },
        },
    }
}

type SyncParts = (Ingestor<RpcFeed>, watch::Receiver<EndpointStatus>);

pub fn build_ingestor(
    config: &Config,
    store: Arc<dyn EntityStore>,
    stop: watch::Receiver<bool>,
) -> Result<SyncParts, Error> {
    let endpoints = EndpointPool::new(
        config.rpc_endpoints.clone(),
        config.rotation_threshold,
    )?;
    let feed = RpcFeed::new(&config.rpc_endpoints, &config.contracts())?;
    let (status, receiver) = watch::channel(endpoints.status(None));
    let ingestor = Ingestor::new(
        feed,
        store,
        endpoints,
        IngestOptions::from_config(config),
        status,
        stop,
    );

    Ok((ingestor, receiver))
}

async fn run_service(
    config: Config,
    ingest: bool,
    api: bool,
) -> Result<(), Error> {
    let store = open_store(&config).await?;
    let (stop, stop_receiver) = watch::channel(false);

    let sync = if ingest && config.enable_sync {
        Some(build_ingestor(&config, store.clone(), stop_receiver)?)
    } else {
        if ingest {
            warn!("ENABLE_SYNC is false, ingestion is disabled");
        }
        None
    };

    let (ingestor, status) = match sync {
        Some((ingestor, status)) => (Some(ingestor), Some(status)),
        None => (None, None),
    };

    let server = if api {
        let state = AppState::new(State::new(config, store, status));
        Some(init_server(state)?)
    } else {
        None
    };
    let handle = server.as_ref().map(Server::handle);

    info!(
        "Service started (ingestion: {}, api: {})",
        ingestor.is_some(),
        server.is_some()
    );

    tokio::try_join!(
        ingest_task(ingestor),
        server_task(server),
        shutdown_task(stop, handle),
    )?;

    info!("Service stopped");
    Ok(())
}

async fn ingest_task(ingestor: Option<Ingestor<RpcFeed>>) -> Result<(), Error> {
    let Some(mut ingestor) = ingestor else {
        return Ok(());
    };

    let report = ingestor.run().await?;
    info!(
        "Ingestion finished: {} blocks, {} events, {} inserted, \
         {} duplicates, {} skipped",
        report.blocks,
        report.events,
        report.inserted,
        report.duplicates,
        report.skipped
    );

    Ok(())
}

async fn server_task(server: Option<Server>) -> Result<(), Error> {
    let Some(server) = server else {
        return Ok(());
    };

    tokio::spawn(async move {
        server.await?;
        Ok::<(), Error>(())
    })
    .await?
}

async fn shutdown_task(
    stop: watch::Sender<bool>,
    handle: Option<ServerHandle>,
) -> Result<(), Error> {
    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    stop.send_replace(true);
    if let Some(handle) = handle {
        handle.stop(true).await;
    }

    Ok(())
}

async fn run_migrate(config: &Config) -> Result<(), Error> {
    if config.store_backend == StoreBackend::Memory {
        info!("In-memory store has no schema to apply");
        return Ok(());
    }

    let database = DatabasePool::new(config).await?;
    info!("Applying database schema...");
    database.init_migrations().await?;
    info!("Schema is up to date");

    Ok(())
}

async fn run_checkpoint_show(config: &Config) -> Result<(), Error> {
    let store = open_store(config).await?;

    match store.checkpoint().await? {
        Some(block) => info!("Checkpoint at block {}", block),
        None => info!(
            "No checkpoint yet, ingestion starts at block {}",
            config.start_block
        ),
    }

    Ok(())
}

async fn run_checkpoint_set(config: &Config, block: i64) -> Result<(), Error> {
    if block < 0 {
        return Err(Error::InvalidOption {
            option: format!("block={}", block),
        });
    }

    let store = open_store(config).await?;
    let previous = store.checkpoint().await?;
    store.set_checkpoint(block).await?;

    info!(
        "Checkpoint moved from {} to {}",
        previous.map_or_else(|| String::from("none"), |b| b.to_string()),
        block
    );

    Ok(())
}
