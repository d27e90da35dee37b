mod cli;

use anyhow::{Context, Result};
use cli::Command;
use rowbeam::{AgeHistogram, Config, DryRunStore, IngestPipeline, UserStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = cli::parse_args();
    let mut config = Config::from_env().context("failed to load configuration")?;
    args.apply(&mut config);

    let store = open_store(&config)?;
    let result = match args.command {
        Command::Process => process(&config, store.as_ref()),
        Command::Ages => report_stored_ages(store.as_ref()),
    };
    if let Err(e) = store.close() {
        warn!(error = %e, "failed to close storage");
    }
    result
}

fn open_store(config: &Config) -> Result<Box<dyn UserStore>> {
    if config.dry_run {
        return Ok(Box::new(DryRunStore::new()));
    }
    connect(config)
}

#[cfg(feature = "postgres")]
fn connect(config: &Config) -> Result<Box<dyn UserStore>> {
    let url = config.require_database_url()?;
    let store = rowbeam::PostgresStore::connect(url).context("failed to connect to database")?;
    Ok(Box::new(store))
}

#[cfg(not(feature = "postgres"))]
fn connect(_config: &Config) -> Result<Box<dyn UserStore>> {
    anyhow::bail!("built without the `postgres` feature; rerun with --dry-run")
}

fn process(config: &Config, store: &dyn UserStore) -> Result<()> {
    info!(input = %config.input_path.display(), dry_run = config.dry_run, "processing CSV");
    let summary = IngestPipeline::from_config(store, config)
        .run(&config.input_path)
        .with_context(|| format!("failed to process {}", config.input_path.display()))?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn report_stored_ages(store: &dyn UserStore) -> Result<()> {
    let ages = store.read_all_ages().context("failed to read stored ages")?;
    let histogram: AgeHistogram = ages.into_iter().collect();
    print!("{}", histogram.distribution());
    Ok(())
}
