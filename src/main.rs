//! Reference attendance service binary.
//!
//! Usage: `attendance-server [CONFIG_DIR]`. The directory defaults to
//! `$ATTENDANCE_CONFIG_DIR`, then `./config/office`.

use std::error::Error;

use geofence_attendance::config::ConfigLoader;
use geofence_attendance::server::{AppState, create_router};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_CONFIG_DIR: &str = "./config/office";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_dir = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("ATTENDANCE_CONFIG_DIR").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_DIR.to_string());

    let loader = match ConfigLoader::load(&config_dir) {
        Ok(loader) => loader,
        Err(e) => {
            error!(config_dir = %config_dir, error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };
    let server = loader.server();
    info!(
        config_dir = %config_dir,
        employees = server.employees.len(),
        "Loaded configuration"
    );

    let app = create_router(AppState::new(server));

    let listener = TcpListener::bind(&server.bind_address).await?;
    info!("Attendance service running on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Attendance service stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install terminate handler");
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
