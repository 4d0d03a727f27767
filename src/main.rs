use anyhow::Result;
use photo_album::{
    AppState, CatalogService, FlashSigner, HttpVision, StorageService, config::AppConfig,
    build_router, run_migrations,
};
use sqlx::sqlite::SqlitePoolOptions;
use std::{fs, io::ErrorKind, path::Path, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + migrate flag ---
    let (cfg, migrate_only) = AppConfig::from_env_and_args()?;

    tracing::info!(
        addr = %cfg.addr(),
        bucket = %cfg.bucket,
        public_base_url = %cfg.public_base_url,
        "starting photo-album"
    );

    // --- Ensure bucket directory exists ---
    let bucket_dir = Path::new(&cfg.storage_dir).join(&cfg.bucket);
    if !bucket_dir.exists() {
        fs::create_dir_all(&bucket_dir)?;
        tracing::info!("created bucket directory {}", bucket_dir.display());
    }

    // --- Initialize SQLite connection ---
    // Extract the local file path SQLx will use and make sure it can exist.
    let db_path = cfg
        .database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("file:");
    let db_path = db_path.split('?').next().unwrap_or(db_path);
    if !db_path.is_empty() && !db_path.starts_with(':') {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
                tracing::info!("created database directory {}", parent.display());
            }
        }
        if !Path::new(db_path).exists() {
            fs::OpenOptions::new()
                .create(true)
                .write(true)
                .open(db_path)?;
        }
    }

    let db = Arc::new(
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&cfg.database_url)
            .await?,
    );

    // --- Apply schema; optionally stop right after ---
    run_migrations(&db).await?;
    if migrate_only {
        tracing::info!("database migration complete");
        return Ok(());
    }

    // --- Initialize collaborators + shared state ---
    let storage = StorageService::new(
        Arc::clone(&db),
        cfg.storage_dir.clone(),
        &cfg.bucket,
        cfg.public_base_url.clone(),
    );
    let catalog = CatalogService::new(Arc::clone(&db));
    let vision = Arc::new(HttpVision::new(
        cfg.vision_endpoint.clone(),
        cfg.vision_api_key.clone(),
    ));
    let state = AppState {
        storage,
        catalog,
        vision,
        flash: FlashSigner::new(cfg.secret_key.as_bytes()),
    };

    // --- Build router ---
    let app = build_router(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "permission denied binding to {} ({}), falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("photo album listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
