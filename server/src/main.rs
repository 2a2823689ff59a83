use std::error::Error;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use credit_ledger_application::infrastructure_config::{Config, StoreBackend};
use server::bootstrap::router::create_router;
use server::bootstrap::state::AppState;
use server::config_loader;
use server::observability;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    let config = config_loader::load_config()?;

    observability::tracing::setup_logging(&config)?;
    log_startup(&config);

    let state = AppState::new(config.clone()).await?;
    let db_pool = state.db_pool().cloned();

    let app = create_router(state).into_make_service_with_connect_info::<SocketAddr>();

    let listener = TcpListener::bind(&config.server_address()).await?;
    info!(address = %config.server_address(), "Credit ledger listening");

    observability::startup_info::print_api_info(&config);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // In-flight grants have finished once serve returns; release connections last.
    if let Some(pool) = db_pool {
        pool.close().await;
        info!("Database pool closed");
    }

    if let Err(e) = served {
        error!(error = %e, "Server terminated with an error");
        return Err(e.into());
    }

    info!("Server shutdown completed");
    Ok(())
}

fn log_startup(config: &Config) {
    info!(
        environment = %config.environment.env,
        backend = ?config.store.backend,
        "Starting credit ledger"
    );
    match config.store.backend {
        StoreBackend::Postgres => info!(database = %config.db.redacted_url(), "Using PostgreSQL"),
        StoreBackend::Memory => warn!("In-memory store selected; balances do not survive a restart"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
            }
        }
    };

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, draining connections"),
        () = terminate => info!("Received SIGTERM, draining connections"),
    }
}
