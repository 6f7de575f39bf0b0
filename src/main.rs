//! Research datamodel service
//!
//! Holds the schema graph of the research project store and plans
//! dependency scans over it: which tables hang off a partition or project,
//! how to select their rows, and in which order copies can be inserted.
//! With a project database configured it also counts the rows a partition
//! copy would touch.

use research_datamodel::config::Settings;
use research_datamodel::datamodel::{catalog, Datamodel};
use research_datamodel::db;
use research_datamodel::routes::create_router;
use research_datamodel::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting research datamodel service...");

    let settings = Settings::load()?;
    info!("Configuration loaded successfully");

    let descriptors = match &settings.datamodel.catalog_path {
        Some(path) => {
            info!("Loading datamodel catalog from {}", path.display());
            catalog::load_from_path(path)?
        }
        None => catalog::research_catalog(),
    };
    let datamodel = Arc::new(Datamodel::build(
        descriptors,
        settings.datamodel.default_edge_weight,
    )?);

    let db_pool = match &settings.database {
        Some(config) => match db::init_pool(config).await {
            Ok(pool) => Some(pool),
            Err(e) => {
                error!("Failed to connect to project database: {}", e);
                warn!("Continuing without a database; row counts are unavailable");
                None
            }
        },
        None => {
            warn!("DATABASE_URL not set; row counts are unavailable");
            None
        }
    };

    let state = Arc::new(AppState::new(datamodel, db_pool));
    let app = create_router(state, &settings);

    let addr = SocketAddr::from((settings.server.host, settings.server.port));
    info!("Server listening on http://{}", addr);
    info!("   GET  /api/datamodel                           - Registry summary");
    info!("   GET  /api/datamodel/tables/{{name}}             - Table descriptor");
    info!("   GET  /api/datamodel/path?from=&to=            - Cheapest join path");
    info!("   POST /api/scans                               - Plan a dependency scan");
    info!("   GET  /api/partitions/{{id}}/duplication-plan    - Partition copy plan");
    info!("   POST /api/partitions/{{id}}/duplication-scan    - Partition row counts");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,research_datamodel=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        },
    }
}
