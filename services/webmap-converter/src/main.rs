//! WebMap to static MapLibre layer configs.
//!
//! Reads a WebMap either from an ArcGIS portal (by item id) or from a local
//! JSON export, converts every operational layer and writes the results as
//! JSON files that a front end can bundle.

mod writer;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use layer_service::{transform_embedded, ArcGisClient, ConverterConfig, WebMapSource, WebMapTransformer};
use serde_json::Value;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "convert-webmap")]
#[command(about = "Convert an ArcGIS WebMap into MapLibre layer configs")]
struct Args {
    /// WebMap item id on the portal
    #[arg(required_unless_present = "input")]
    webmap_id: Option<String>,

    /// Read the WebMap from a local JSON file instead of the portal
    #[arg(short, long, conflicts_with = "webmap_id")]
    input: Option<PathBuf>,

    /// Directory for `{id}.json` files and `index.json`
    #[arg(short, long, default_value = "layers")]
    output_dir: PathBuf,

    /// Use only renderers embedded in the WebMap; never contact feature services
    #[arg(long)]
    offline: bool,

    /// Converter configuration (YAML); defaults to $WEBMAP_CONVERTER_CONFIG
    #[arg(long)]
    config: Option<PathBuf>,

    /// Token for WebMaps that are not public
    #[arg(long, env = "ARCGIS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Override the portal URL from the configuration
    #[arg(long, env = "ARCGIS_PORTAL_URL")]
    portal_url: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => ConverterConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ConverterConfig::from_env().context("Failed to load configuration")?,
    };
    if let Some(portal_url) = &args.portal_url {
        config.portal_url = portal_url.clone();
    }
    config.validate().context("Invalid converter configuration")?;

    let client = ArcGisClient::new(&config).context("Failed to create ArcGIS client")?;
    let doc = load_webmap(&args, &client).await?;

    let layers = if args.offline {
        info!("Offline mode, using embedded renderers only");
        transform_embedded(&doc, &config)?
    } else {
        WebMapTransformer::new(client, Arc::new(config))
            .transform(&doc)
            .await?
    };

    if layers.is_empty() {
        warn!("WebMap produced no layers");
    }

    let written = writer::write_layer_files(&args.output_dir, &layers).await?;
    info!(
        layers = layers.len(),
        files = written.len(),
        output_dir = %args.output_dir.display(),
        "Wrote layer configs"
    );

    Ok(())
}

async fn load_webmap(args: &Args, client: &ArcGisClient) -> Result<Value> {
    if let Some(path) = &args.input {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return serde_json::from_str(&contents)
            .with_context(|| format!("{} is not valid JSON", path.display()));
    }

    let webmap_id = args
        .webmap_id
        .as_deref()
        .context("Either a WebMap id or --input is required")?;
    client
        .fetch_webmap(webmap_id, args.token.as_deref())
        .await
        .with_context(|| format!("Failed to fetch WebMap {}", webmap_id))
}
