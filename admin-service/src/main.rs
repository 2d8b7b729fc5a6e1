//! Admin Service entry point.

use admin_service::config::AdminConfig;
use admin_service::services::init_metrics;
use admin_service::startup::{grpc_port_for, Application};

use service_core::observability::init_tracing;
use tokio::signal;

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load configuration
    let config = AdminConfig::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    )
    .map_err(|e| {
        eprintln!("Failed to initialize tracing: {}", e);
        std::io::Error::other(format!("Tracing error: {}", e))
    })?;

    tracing::info!(
        version = %config.service_version,
        otlp_endpoint = ?config.otlp_endpoint,
        "Starting admin-service"
    );

    init_metrics();

    let grpc_port = grpc_port_for(config.common.port).map_err(|e| {
        tracing::error!(error = %e, "Invalid port configuration");
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    // Log configuration (mask sensitive values)
    tracing::info!(
        service_name = %config.service_name,
        http_port = %config.common.port,
        grpc_port = %grpc_port,
        request_timeout_secs = config.common.request_timeout_secs,
        shutdown_delay_secs = config.common.shutdown_delay_secs,
        db_max_connections = %config.database.max_connections,
        db_min_connections = %config.database.min_connections,
        cognito_region = %config.cognito.region,
        "Configuration loaded"
    );

    let shutdown_delay = config.common.shutdown_delay();
    let app = Application::build(config).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to build application");
        std::io::Error::other(format!("Application build error: {}", e))
    })?;

    let readiness = app.readiness();
    let shutdown = app.shutdown_token();
    tokio::spawn(async move {
        shutdown_signal().await;
        // Fail the probes first so load balancers stop routing to us.
        readiness.set_not_serving().await;
        tracing::info!(delay_secs = shutdown_delay.as_secs(), "Draining before shutdown");
        tokio::time::sleep(shutdown_delay).await;
        shutdown.cancel();
    });

    if let Err(e) = app.run_until_stopped().await {
        tracing::error!(error = %e, "Application error");
        return Err(e);
    }

    tracing::info!("Service shutdown complete");
    Ok(())
}
