/// Public library interface for the Habit Tracker API server
///
/// This module exports the server implementation and the public types
/// that can be used by other applications or tests.

use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;

// Internal modules
mod domain;
mod storage;
mod service;
pub mod api;
pub mod config;

// Re-export public modules and types
pub use domain::*;
pub use storage::{
    HabitStorage, ImageStore, ImageStoreConfig, ImageStoreError, SqliteStorage, StorageError,
    StoredImage,
};
pub use service::{HabitService, ServiceError};
pub use api::AppState;
pub use config::Config;

/// Errors that can occur while starting or running the server
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(#[from] StorageError),

    #[error("Image storage error: {0}")]
    Images(#[from] ImageStoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main habit tracker server
///
/// Owns the configured storage, image store and service, and serves them
/// over HTTP.
pub struct HabitTrackerServer {
    config: Config,
    state: Arc<AppState<SqliteStorage>>,
}

impl HabitTrackerServer {
    /// Create a new habit tracker server from its configuration
    ///
    /// This opens (and migrates) the SQLite database and prepares the upload
    /// directory. Failing either is fatal.
    pub async fn new(config: Config) -> Result<Self, ServerError> {
        let db_path = config.database_path()?;
        let upload_dir = config.upload_path()?;
        tracing::info!("Initializing Habit Tracker server with database: {:?}", db_path);

        let storage = SqliteStorage::new(&db_path)?;
        let images = ImageStore::init(ImageStoreConfig {
            root: upload_dir,
            max_bytes: config.max_upload_bytes,
        })
        .await?;

        let service = HabitService::new(storage, images, config.require_description);
        let state = Arc::new(AppState::new(service, config.completion_mode));

        Ok(Self { config, state })
    }

    /// Build the HTTP router (useful for testing without a socket)
    pub fn router(&self) -> Router {
        api::router(self.state.clone())
    }

    /// Get a reference to the service layer (useful for testing)
    pub fn service(&self) -> &HabitService<SqliteStorage> {
        &self.state.service
    }

    /// Bind the configured address and serve until Ctrl+C or SIGTERM
    pub async fn run(self) -> Result<(), ServerError> {
        // Test database connectivity
        let habits = self.state.service.storage().list_habits()?;
        tracing::info!("Found {} existing habits", habits.len());

        let address = self.config.bind_address();
        tracing::info!("Binding to {address}");
        let listener = TcpListener::bind(&address).await?;
        tracing::info!("Server running on {address}");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutting down...");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
