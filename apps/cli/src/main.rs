use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use transit_cache::SqliteCache;
use transit_routes::{
    GetTransitTimesTool, RealRoutesEnvironment, RoutesConfig, Tool, ToolContext, TransitPipeline,
    TravelMode,
};

/// Ask how long it takes to get somewhere.
#[derive(Debug, Parser)]
#[command(name = "transit", version, about)]
struct Cli {
    /// Destination address or place name.
    #[arg(required_unless_present = "clear_cache")]
    destination: Option<String>,

    /// Google Routes API key.
    #[arg(long, env = "TRANSIT_ROUTES_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Origin latitude in decimal degrees.
    #[arg(
        long,
        env = "TRANSIT_ROUTES_LATITUDE",
        allow_negative_numbers = true,
        value_parser = parse_coordinate
    )]
    latitude: Option<f64>,

    /// Origin longitude in decimal degrees.
    #[arg(
        long,
        env = "TRANSIT_ROUTES_LONGITUDE",
        allow_negative_numbers = true,
        value_parser = parse_coordinate
    )]
    longitude: Option<f64>,

    /// DRIVE, WALK, BICYCLE, TRANSIT or TWO_WHEELER.
    #[arg(long, env = "TRANSIT_ROUTES_TRAVEL_MODE")]
    travel_mode: Option<TravelMode>,

    /// JSON config file; flags and env vars override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Cache database path.
    #[arg(long, env = "TRANSIT_CACHE_PATH")]
    cache: Option<PathBuf>,

    /// Remove all cached routes before running.
    #[arg(long)]
    clear_cache: bool,
}

fn parse_coordinate(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid coordinate '{raw}'"))?;
    if !value.is_finite() {
        return Err(format!("coordinate must be finite, got {raw}"));
    }
    Ok(value)
}

impl Cli {
    fn routes_config(&self) -> anyhow::Result<RoutesConfig> {
        let base = match &self.config {
            Some(path) => RoutesConfig::from_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => RoutesConfig::default(),
        };

        Ok(base.overlay(&RoutesConfig {
            api_key: self.api_key.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            travel_mode: self.travel_mode,
        }))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,transit=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.routes_config()?;

    let cache_path = cli
        .cache
        .clone()
        .or_else(SqliteCache::default_path)
        .context("no cache directory available; pass --cache")?;
    let cache = Arc::new(
        SqliteCache::open(&cache_path)
            .with_context(|| format!("opening cache at {}", cache_path.display()))?,
    );

    if cli.clear_cache {
        cache.clear()?;
    }

    let Some(destination) = cli.destination else {
        return Ok(());
    };

    let env = Arc::new(RealRoutesEnvironment::new(reqwest::Client::new()));
    let tool = GetTransitTimesTool::new(TransitPipeline::new(cache, env));

    tracing::info!(tool = %tool.name(), destination = %destination, "Running tool");

    let result = tool
        .execute(
            &serde_json::json!({ "destination": destination }),
            &ToolContext::new(config),
        )
        .await?;

    println!("{}", serde_json::to_string_pretty(&result.payload)?);
    Ok(())
}
