use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use tracing::warn;
use uuid::Uuid;

const DEFAULT_VISION_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: String,
    pub database_url: String,
    /// Bucket name, doubling as the payload directory under `storage_dir`.
    pub bucket: String,
    /// Absolute URL prefix baked into stored `image_public_url` values.
    pub public_base_url: String,
    /// Secret for signing flash cookies.
    pub secret_key: String,
    /// Annotate endpoint for the vision gateway.
    pub vision_endpoint: String,
    /// API key for the vision gateway; label detection fails without one.
    pub vision_api_key: Option<String>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Photo album web service")]
pub struct Args {
    /// Host to bind to (overrides PHOTO_ALBUM_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PHOTO_ALBUM_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where blobs are stored (overrides PHOTO_ALBUM_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Database URL (overrides PHOTO_ALBUM_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Bucket name (overrides PHOTO_ALBUM_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Public URL prefix for stored photos (overrides PHOTO_ALBUM_PUBLIC_BASE_URL)
    #[arg(long)]
    pub public_base_url: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    ///
    /// Secrets (`PHOTO_ALBUM_SECRET_KEY`, `PHOTO_ALBUM_VISION_API_KEY`) come
    /// from the environment only, never from flags.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("PHOTO_ALBUM_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("PHOTO_ALBUM_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing PHOTO_ALBUM_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 8080,
            Err(err) => return Err(err).context("reading PHOTO_ALBUM_PORT"),
        };
        let env_storage =
            env::var("PHOTO_ALBUM_STORAGE_DIR").unwrap_or_else(|_| "./data/objects".into());
        let env_db = env::var("PHOTO_ALBUM_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/catalog/photo_album.db?mode=rwc".into());
        let env_bucket = env::var("PHOTO_ALBUM_BUCKET").unwrap_or_else(|_| "photo-album".into());
        let env_public_base = env::var("PHOTO_ALBUM_PUBLIC_BASE_URL").ok();

        // --- Merge ---
        let host = args.host.unwrap_or(env_host);
        let port = args.port.unwrap_or(env_port);
        let public_base_url = args
            .public_base_url
            .or(env_public_base)
            .unwrap_or_else(|| default_public_base_url(&host, port));

        let secret_key = match env::var("PHOTO_ALBUM_SECRET_KEY") {
            Ok(value) if !value.is_empty() => value,
            _ => {
                warn!(
                    "PHOTO_ALBUM_SECRET_KEY is not set; using a generated secret, \
                     flash messages will not survive a restart"
                );
                Uuid::new_v4().simple().to_string()
            }
        };

        let cfg = Self {
            host,
            port,
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            database_url: args.database_url.unwrap_or(env_db),
            bucket: args.bucket.unwrap_or(env_bucket),
            public_base_url,
            secret_key,
            vision_endpoint: env::var("PHOTO_ALBUM_VISION_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_VISION_ENDPOINT.into()),
            vision_api_key: env::var("PHOTO_ALBUM_VISION_API_KEY")
                .ok()
                .filter(|key| !key.is_empty()),
        };

        Ok((cfg, args.migrate))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Public URLs must be reachable by a browser, so a wildcard bind address
/// falls back to loopback in the derived default.
fn default_public_base_url(host: &str, port: u16) -> String {
    let display_host = match host {
        "0.0.0.0" | "::" => "127.0.0.1",
        other => other,
    };
    format!("http://{display_host}:{port}")
}
