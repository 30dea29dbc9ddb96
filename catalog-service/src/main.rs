use catalog_service::config::{BackendKind, Config};
use catalog_service::models::book::sample_catalog;
use catalog_service::models::storage::{Backend, MemoryBackend, PostgresBackend, StorageError};
use catalog_service::routes::{create_router, AppState};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

async fn connect_backend(config: &Config) -> Result<Backend, StorageError> {
    match config.backend {
        BackendKind::Postgres => {
            info!("Using PostgreSQL backend");
            let backend =
                PostgresBackend::new(&config.database_url, config.max_connections).await?;
            Ok(Arc::new(backend))
        }
        BackendKind::Memory => {
            let backend = match &config.books_file {
                Some(path) => MemoryBackend::from_json_file(path)?,
                None => MemoryBackend::new(sample_catalog()),
            };
            info!("Using in-memory backend with {} books", backend.len());
            Ok(Arc::new(backend))
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("catalog_service=info,tower_http=info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let backend = match connect_backend(&config).await {
        Ok(backend) => backend,
        Err(e) => {
            error!("Failed to open storage backend: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = backend.test_connection().await {
        error!("Failed to connect to storage backend: {}", e);
        std::process::exit(1);
    }
    info!("Storage backend connection successful");

    let app = create_router(AppState {
        store: backend,
        missing_parameter_status: config.missing_parameter_status,
    });

    let addr = format!("0.0.0.0:{}", config.port);
    info!("Catalog service starting on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
