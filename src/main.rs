//! MediaVault -- image and PDF upload/download server.
//!
//! Crash-only design: every startup is a recovery. Blob writes are atomic
//! renames, so an interrupted upload leaves at most a stray temp file and
//! no metadata record. SIGTERM/SIGINT handlers only stop accepting
//! connections and wait with a timeout before exiting.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use mediavault::config::{Config, LoggingConfig};
use mediavault::metadata::store::MetadataStore;
use mediavault::storage::backend::BlobStore;

/// Command-line arguments for the MediaVault server.
#[derive(Parser, Debug)]
#[command(
    name = "mediavault",
    version,
    about = "Image and PDF upload/download server"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "mediavault.example.yaml")]
    config: String,

    /// Override the bind address (host:port).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = mediavault::config::load_config(&cli.config)?;

    init_tracing(&config.logging);
    info!("Loaded configuration from {}", cli.config);

    let bind_addr = cli
        .bind
        .unwrap_or_else(|| format!("{}:{}", config.server.host, config.server.port));

    if config.observability.metrics {
        mediavault::metrics::init_metrics()?;
        mediavault::metrics::describe_metrics();
        info!("Prometheus metrics initialized");
    }

    let metadata = build_metadata(&config)?;
    let blobs = build_blobs(&config)?;

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout);
    let state = Arc::new(mediavault::AppState::new(config, metadata, blobs));
    let app = mediavault::server::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("MediaVault listening on {}", bind_addr);

    // On SIGTERM/SIGINT stop accepting connections and let in-flight
    // requests drain, but never for longer than shutdown_timeout.
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tokio::spawn(async move {
                tokio::time::sleep(shutdown_timeout).await;
                warn!(
                    "In-flight requests still running after {}s, exiting",
                    shutdown_timeout.as_secs()
                );
                std::process::exit(1);
            });
        })
        .await?;

    info!("MediaVault shut down");

    Ok(())
}

/// Install the global tracing subscriber. `RUST_LOG` overrides `logging.level`.
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_metadata(config: &Config) -> anyhow::Result<Arc<dyn MetadataStore>> {
    match config.metadata.engine.as_str() {
        "memory" => {
            info!("In-memory metadata store initialized (records are not persisted)");
            Ok(Arc::new(
                mediavault::metadata::memory::MemoryMetadataStore::new(),
            ))
        }
        "sqlite" => {
            let path = &config.metadata.sqlite.path;
            // Ensure parent directory exists for the SQLite file.
            if let Some(parent) = std::path::Path::new(path).parent() {
                std::fs::create_dir_all(parent)?;
            }
            let store = mediavault::metadata::sqlite::SqliteMetadataStore::new(path)?;
            info!("SQLite metadata store initialized at {}", path);
            Ok(Arc::new(store))
        }
        other => anyhow::bail!("unknown metadata.engine '{other}' (expected sqlite or memory)"),
    }
}

fn build_blobs(config: &Config) -> anyhow::Result<Arc<dyn BlobStore>> {
    match config.storage.backend.as_str() {
        "memory" => {
            info!("In-memory blob store initialized (blobs are not persisted)");
            Ok(Arc::new(mediavault::storage::memory::MemoryBlobStore::new()))
        }
        "local" => {
            info!(
                "Local blob store initialized: images={} pdfs={}",
                config.storage.image_dir, config.storage.pdf_dir
            );
            Ok(Arc::new(mediavault::storage::local::LocalBlobStore::new()))
        }
        other => anyhow::bail!("unknown storage.backend '{other}' (expected local or memory)"),
    }
}

/// Wait for SIGTERM or SIGINT (Ctrl+C), then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }
}
