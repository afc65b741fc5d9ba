//! MemoPal API server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) overlaid with
//! `MEMOPAL_*` environment variables, opens the SQLite store, and serves the
//! REST API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use clap::Parser;
use memopal_api::{AppState, ServerConfig, media::MediaStore, session::TokenSigner};
use memopal_inference::{HttpInference, InferenceConfig};
use memopal_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "MemoPal API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("MEMOPAL"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let upload_dir = expand_tilde(&server_cfg.upload_dir);
  let media = MediaStore::new(&upload_dir);
  media
    .init()
    .await
    .with_context(|| format!("failed to create upload dir {upload_dir:?}"))?;

  let inference = HttpInference::new(InferenceConfig {
    base_url: server_cfg.inference_url.clone(),
    timeout:  Duration::from_secs(server_cfg.inference_timeout_secs),
  })
  .context("failed to build inference client")?;

  let ttl = i64::try_from(server_cfg.token_ttl_secs)
    .ok()
    .and_then(chrono::Duration::try_seconds)
    .context("token_ttl_secs out of range")?;
  let tokens = TokenSigner::new(&server_cfg.token_secret, ttl)
    .context("invalid token settings")?;

  let state = AppState {
    store:            Arc::new(store),
    inference:        Arc::new(inference),
    media:            Arc::new(media),
    tokens:           Arc::new(tokens),
    max_upload_bytes: server_cfg.max_upload_bytes,
  };

  let app = memopal_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!(
    inference = %server_cfg.inference_url,
    "Listening on http://{address}"
  );
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
