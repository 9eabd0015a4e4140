use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use enrichment_server::config::FileConfig;
use enrichment_server::cost::{load_fuel_prices, FuelPriceFeed};
use enrichment_server::enrich::Enricher;
use enrichment_server::evidence::{load_evidence, SharedEvidence};
use enrichment_server::reference::{load_reference, SnapshotStore};
use enrichment_server::refresh::{spawn_periodic_refresh, Refresher};
use enrichment_server::server::state::ServerState;
use enrichment_server::server::{metrics, run_server, ServerConfig};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the canonical variant reference dataset (JSON).
    #[clap(value_parser = parse_path)]
    pub reference_data: PathBuf,

    /// Path to the evidence record dataset (JSON).
    #[clap(value_parser = parse_path)]
    pub evidence_data: PathBuf,

    /// Path to the fuel price feed snapshot (JSON).
    #[clap(value_parser = parse_path)]
    pub fuel_prices: PathBuf,

    /// Path to an optional TOML configuration file.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// Interval in seconds between dataset refreshes. Set to 0 to disable
    /// the background refresh.
    #[clap(long, default_value_t = 900)]
    pub refresh_interval_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}...", path);
            FileConfig::load(path)?
        }
        None => FileConfig::default(),
    };
    let engine_config = file_config.engine_config();
    let port = file_config.port.unwrap_or(cli_args.port);
    let refresh_interval_secs = file_config
        .refresh_interval_secs
        .unwrap_or(cli_args.refresh_interval_secs);

    let check_all = cfg!(not(feature = "no_checks"));

    info!("Loading reference dataset {:?}...", cli_args.reference_data);
    let reference = load_reference(&cli_args.reference_data, check_all)?;
    info!("Loading evidence dataset {:?}...", cli_args.evidence_data);
    let (evidence_store, _problems) = load_evidence(&cli_args.evidence_data)?;
    info!("Loading fuel prices {:?}...", cli_args.fuel_prices);
    let fuel_prices = load_fuel_prices(&cli_args.fuel_prices)?;

    info!("Initializing metrics...");
    metrics::init_metrics();

    let snapshots = Arc::new(SnapshotStore::new(reference.index));
    let evidence = Arc::new(SharedEvidence::new(evidence_store));
    let prices = Arc::new(FuelPriceFeed::new(fuel_prices));
    {
        let snapshot = snapshots.current();
        metrics::set_dataset_metrics(
            snapshot.index.variants_count(),
            snapshot.version,
            evidence.current().records_count(),
        );
    }

    let enricher = Arc::new(Enricher::new(
        engine_config,
        snapshots.clone(),
        evidence.clone(),
        prices.clone(),
    ));
    let refresher = Arc::new(Refresher::new(
        cli_args.reference_data.clone(),
        cli_args.evidence_data.clone(),
        cli_args.fuel_prices.clone(),
        check_all,
        snapshots.clone(),
        evidence.clone(),
        prices.clone(),
    ));
    if refresh_interval_secs > 0 {
        info!("Dataset refresh enabled every {} seconds", refresh_interval_secs);
        spawn_periodic_refresh(refresher.clone(), refresh_interval_secs);
    }

    let state = ServerState {
        config: ServerConfig { port },
        start_time: Instant::now(),
        enricher,
        snapshots,
        evidence,
        prices,
        refresher,
        hash: env!("GIT_HASH").to_string(),
    };

    info!("Ready to serve at port {}!", port);
    run_server(state).await
}
