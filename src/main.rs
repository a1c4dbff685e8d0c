use std::process::ExitCode;

use tracing::{error, info};

use depot::{Config, Database, ItemRepository, ItemService, ItemStorage, WebServer};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> ExitCode {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    // Load configuration
    let config = match Config::load_with_env(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = depot::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        depot::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    info!("depot file manager");

    let db = match Database::connect(&config.database).await {
        Ok(db) => db,
        Err(e) => {
            error!("Database unavailable: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let storage = match ItemStorage::new(&config.storage.root) {
        Ok(storage) => storage,
        Err(e) => {
            error!("Cannot use storage root {}: {}", config.storage.root, e);
            return ExitCode::FAILURE;
        }
    };
    info!("Storage root: {}", storage.root().display());

    let max_upload = usize::try_from(config.storage.max_upload_bytes()).unwrap_or(usize::MAX);
    let service = ItemService::new(ItemRepository::new(db.clone(), storage), max_upload);

    let server = match WebServer::new(&config.server, service) {
        Ok(server) => server,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = server.run().await;
    db.close().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Web server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
