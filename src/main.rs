use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use personio_source::app::ports::NodeFactory;
use personio_source::config::Config;
use personio_source::constants::{
    CACHE_DB_FILE, DEFAULT_CONFIG_FILE, FILES_DIR, NODE_SNAPSHOT_FILE, PLUGIN_NAME,
};
use personio_source::digest::Uuid5NodeFactory;
use personio_source::domain::EmployeeList;
use personio_source::infra::cache_store::SqliteCache;
use personio_source::infra::diagnostics::TracingDiagnostics;
use personio_source::infra::node_store::InMemoryNodeStore;
use personio_source::infra::personio_client::PersonioClient;
use personio_source::infra::remote_file::ReqwestRemoteFiles;
use personio_source::logging;
use personio_source::metrics::SyncMetrics;
use personio_source::pipeline::normalize::RecordNormalizer;
use personio_source::{SourceNodesUseCase, SourcePorts};

#[derive(Parser)]
#[command(name = "personio_source")]
#[command(about = "Source Personio employees and profile pictures into a content node store")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch employees, create nodes and sync profile pictures
    Source {
        /// Path to the TOML config file
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
        /// Override the data directory (node snapshot, cache, files)
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Write a Prometheus text snapshot of the run's metrics here
        #[arg(long)]
        metrics_out: Option<PathBuf>,
    },
    /// Normalize a saved employee-list response and print the nodes as JSON
    Normalize {
        /// Saved response of the employees endpoint
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Source {
            config,
            data_dir,
            metrics_out,
        } => {
            let result = run_source(&config, data_dir, metrics_out.as_deref()).await;
            if let Err(e) = &result {
                error!("Sourcing failed: {:#}", e);
            }
            result
        }
        Commands::Normalize { input, config } => run_normalize(&input, &config),
    }
}

async fn run_source(
    config_path: &Path,
    data_dir: Option<PathBuf>,
    metrics_out: Option<&Path>,
) -> Result<()> {
    let metrics_handle = match metrics_out {
        Some(_) => Some(
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .context("installing metrics recorder")?,
        ),
        None => None,
    };
    SyncMetrics::register_metrics();

    let config = Config::load(config_path)?;
    let data_dir = data_dir.unwrap_or_else(|| config.storage.data_dir.clone());
    info!(data_dir = %data_dir.display(), "Using data directory");

    let factory: Arc<dyn NodeFactory> = Arc::new(Uuid5NodeFactory::new(PLUGIN_NAME));
    let snapshot_path = data_dir.join(NODE_SNAPSHOT_FILE);
    let store = Arc::new(
        InMemoryNodeStore::load(&snapshot_path)
            .with_context(|| format!("loading node snapshot {}", snapshot_path.display()))?,
    );
    let cache = Arc::new(SqliteCache::open(data_dir.join(CACHE_DB_FILE))?);
    let client = Arc::new(PersonioClient::new(&config.api.base_url));
    let files = Arc::new(ReqwestRemoteFiles::new(
        data_dir.join(FILES_DIR),
        factory.clone(),
        store.clone(),
    ));

    let ports = SourcePorts {
        auth: client.clone(),
        directory: client,
        store: store.clone(),
        factory,
        cache,
        files,
        diagnostics: Arc::new(TracingDiagnostics),
    };

    let use_case = SourceNodesUseCase::new(ports, config.api.credentials(), config.sync.clone());
    let report = use_case.run().await?;

    let removed = store.collect_garbage();
    store.save(&snapshot_path)?;

    println!("\n📊 Personio source results:");
    println!("   Records received: {}", report.records_received);
    println!("   Nodes created: {}", report.nodes_created);
    println!("   Records skipped: {}", report.records_skipped);
    println!("   Pictures downloaded: {}", report.attachments_downloaded);
    println!("   Pictures reused: {}", report.attachments_reused);
    println!("   Pictures failed: {}", report.attachments_failed);
    println!("   Stale nodes removed: {}", removed);

    if let (Some(handle), Some(path)) = (metrics_handle, metrics_out) {
        std::fs::write(path, handle.render())
            .with_context(|| format!("writing metrics to {}", path.display()))?;
    }

    Ok(())
}

fn run_normalize(input: &Path, config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    let raw = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let list: EmployeeList = serde_json::from_slice(&raw)?;

    let normalizer = RecordNormalizer::new(
        Arc::new(Uuid5NodeFactory::new(PLUGIN_NAME)),
        &config.sync.node_type,
        &config.sync.attachment_field,
    );
    let outcome = normalizer.normalize(&list.into_entries(), &TracingDiagnostics);
    info!(
        nodes = outcome.nodes.len(),
        skipped = outcome.skipped,
        "Normalized saved response"
    );
    println!("{}", serde_json::to_string_pretty(&outcome.nodes)?);
    Ok(())
}
