use std::process::ExitCode;

use tracing::{error, info};

use docflow::document::{allowed_types_description, LocalFileStore};
use docflow::{Config, Database};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = docflow::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        docflow::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {e}");
        return ExitCode::FAILURE;
    }

    info!("DocFlow - document upload ingestion");

    let db = match Database::open(&config.database.path).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to open database {}: {e}", config.database.path);
            return ExitCode::FAILURE;
        }
    };
    info!("Database ready at {}", config.database.path);

    let store = match LocalFileStore::new(&config.storage.root) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open storage root {}: {e}", config.storage.root);
            db.close().await;
            return ExitCode::FAILURE;
        }
    };

    match store.purge_staging() {
        Ok(removed) => info!(
            "Storage ready at {} ({removed} staging file(s) purged)",
            config.storage.root
        ),
        Err(e) => {
            error!("Failed to sweep storage root {}: {e}", config.storage.root);
            db.close().await;
            return ExitCode::FAILURE;
        }
    }

    info!(
        "Upload policy: max size {} bytes, allowed types: {}",
        config.storage.max_upload_size,
        allowed_types_description()
    );

    db.close().await;
    ExitCode::SUCCESS
}
