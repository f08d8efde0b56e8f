use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use farmnest_backend::app::App;

#[tokio::main]
async fn main() {
    // Initialize tracing with detailed logging
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .with_ansi(true)
        .init();

    info!("🚀 Starting FarmNest Backend Application");

    // Load environment variables from .env file
    match dotenv() {
        Ok(_) => info!("✅ Successfully loaded .env file"),
        Err(e) => warn!("⚠️ Failed to load .env file: {} (using system env vars)", e),
    }

    // Create and start the App
    let app = App::new().await;
    app.start().await;
}
