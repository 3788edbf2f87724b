use std::env;

use cachefall_server::config::loader::load_config;
use cachefall_server::{apply_logging_level, build_app, build_state, init_tracing, serve};

#[tokio::main]
async fn main() {
    // Load .env file if present (before anything else)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    // Initialize tracing early with the default level
    init_tracing();

    // Config path from the first CLI argument or CACHEFALL_CONFIG, falling
    // back to ./cachefall.toml
    let config_path = env::args().nth(1).or_else(|| env::var("CACHEFALL_CONFIG").ok());

    let cfg = match load_config(config_path.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };
    apply_logging_level(&cfg.logging.level);
    tracing::info!(
        path = config_path.as_deref().unwrap_or("cachefall.toml"),
        "Configuration loaded"
    );

    let state = match build_state(&cfg).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Startup error: {e}");
            std::process::exit(2);
        }
    };

    let app = build_app(state);
    if let Err(e) = serve(cfg.addr(), app).await {
        tracing::error!(error = %e, "server exited with error");
        std::process::exit(1);
    }
}
