/// Main entry point for the Habit Tracker API server
///
/// This file sets up logging, parses command line arguments and environment
/// configuration, and starts the HTTP server.

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use habit_tracker_api::{Config, HabitTrackerServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    // RUST_LOG wins over the command line flags when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = config.log_level();
        EnvFilter::new(format!("habit_tracker_api={level},tower_http={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Habit Tracker API server");
    info!(
        "Completion mode: {}, max upload: {} bytes",
        config.completion_mode.display_name(),
        config.max_upload_bytes
    );

    let server = HabitTrackerServer::new(config).await?;

    server.run().await?;

    info!("Habit Tracker API server shutdown complete");
    Ok(())
}
