use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, ServerConfig, router};

/// Main entry point for the CellCount application
///
/// Serves the REST API with OpenAPI/Swagger UI and shuts down cleanly on Ctrl-C.
///
/// # Environment Variables
/// - `CELLCOUNT_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CELLCOUNT_DATA_DIR`: directory holding records and credentials (default: "cellcount_data")
/// - `CELLCOUNT_CREDENTIALS_FILE`: user registry (default: "<data dir>/credentials.yaml")
/// - `CELLCOUNT_SESSION_TTL_HOURS`: login lifetime (default: 12)
/// - `CELLCOUNT_DEFAULT_PANEL`: panel for new counting sessions (default: "white_differential")
///
/// # Returns
/// * `Ok(())` - If the server starts and stops cleanly
/// * `Err(anyhow::Error)` - If configuration, startup or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cellcount_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("cellcount_core=info".parse()?)
                .add_directive("cellcount_auth=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = ServerConfig::from_env()?;
    tracing::info!("++ Starting CellCount REST on {}", cfg.addr);
    tracing::info!(
        "++ Data directory {} (default panel {})",
        cfg.core.data_dir().display(),
        cfg.core.default_panel()
    );

    let app = router(AppState::new(cfg.core.clone(), cfg.auth.clone()));
    let listener = tokio::net::TcpListener::bind(&cfg.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("++ CellCount stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
