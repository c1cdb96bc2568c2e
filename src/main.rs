use std::sync::Arc;

use tracing::{error, info};

use assetvault::web::WebServer;
use assetvault::{Config, Database};

#[tokio::main]
async fn main() {
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
    if let Err(e) = assetvault::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        assetvault::logging::init_console_only(&config.logging.level);
    }

    info!("assetvault - asset upload service");

    if let Err(e) = config.validate() {
        error!("{}", e);
        std::process::exit(1);
    }

    let db = match Database::open(&config.database.path).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    let server = match WebServer::new(&config, Arc::new(db)) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to initialize web server: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Serving uploads from {} on {}",
        config.uploads.root,
        server.addr()
    );

    if let Err(e) = server.run().await {
        error!("Web server error: {}", e);
        std::process::exit(1);
    }
}
