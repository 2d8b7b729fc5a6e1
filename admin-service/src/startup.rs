//! Application startup and lifecycle management.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use aws_config::{BehaviorVersion, Region};
use futures::future::{BoxFuture, FutureExt};
use service_core::error::AppError;
use service_core::grpc::{
    create_reflection_service, trace_context_interceptor, GrpcServerBuilder, Readiness,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::AdminConfig;
use crate::grpc::proto::{admin_service_server::AdminServiceServer, FILE_DESCRIPTOR_SET};
use crate::grpc::AdminServiceImpl;
use crate::services::{
    AdminAuthProvider, AdminService, AdminStore, CognitoAdminAuth, Database,
};
use crate::{build_router, AppState};

/// Fully qualified name reported through `grpc.health.v1`.
pub const GRPC_SERVICE_NAME: &str = "micros.admin.v1.AdminService";

type GrpcServe = BoxFuture<'static, Result<(), tonic::transport::Error>>;

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    grpc_port: u16,
    http_listener: TcpListener,
    grpc_server: GrpcServe,
    state: AppState,
}

impl Application {
    /// Connect to Postgres and Cognito, apply migrations and bind listeners.
    pub async fn build(config: AdminConfig) -> Result<Self, AppError> {
        Self::build_internal(config, true).await
    }

    /// Build the application without running migrations.
    /// Use this when migrations are already applied by the test harness.
    pub async fn build_without_migrations(config: AdminConfig) -> Result<Self, AppError> {
        Self::build_internal(config, false).await
    }

    async fn build_internal(config: AdminConfig, run_migrations: bool) -> Result<Self, AppError> {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.cognito.region.clone()));

        // The store and the provider client are independent; bring them up together.
        let (db, sdk_config) = tokio::try_join!(Database::new(&config.database), async {
            Ok::<_, AppError>(sdk_config.load().await)
        })
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        if run_migrations {
            db.run_migrations().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to run migrations");
                e
            })?;
        }

        let provider = CognitoAdminAuth::from_sdk_config(&sdk_config, &config.cognito);
        tracing::info!(
            region = %config.cognito.region,
            user_pool_id = %config.cognito.user_pool_id,
            "Cognito client configured"
        );

        Self::from_parts(config, Arc::new(db), Arc::new(provider)).await
    }

    /// Assemble the application around an existing store and provider.
    pub async fn from_parts(
        config: AdminConfig,
        store: Arc<dyn AdminStore>,
        provider: Arc<dyn AdminAuthProvider>,
    ) -> Result<Self, AppError> {
        let admin = AdminService::new(store, provider);
        let shutdown = CancellationToken::new();
        let requests = CancellationToken::new();
        let health = Readiness::new(GRPC_SERVICE_NAME);

        // Bind HTTP listener
        let http_addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let http_listener = TcpListener::bind(http_addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %http_addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let http_port = http_listener.local_addr()?.port();

        // Bind gRPC listener (port + 1, or ephemeral when the HTTP port is)
        let grpc_port = grpc_port_for(config.common.port)?;
        let grpc_addr = SocketAddr::from(([0, 0, 0, 0], grpc_port));
        let grpc_listener = TcpListener::bind(grpc_addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %grpc_addr, "Failed to bind gRPC listener");
            AppError::from(e)
        })?;
        let grpc_port = grpc_listener.local_addr()?.port();

        let reflection_service = create_reflection_service(&[FILE_DESCRIPTOR_SET])
            .map_err(|e| AppError::Internal(format!("Failed to build reflection service: {}", e)))?;

        let grpc_trace_layer = TraceLayer::new_for_grpc()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::DEBUG));

        let admin_service = AdminServiceServer::with_interceptor(
            AdminServiceImpl::new(
                admin.clone(),
                requests.clone(),
                config.common.request_timeout(),
            ),
            trace_context_interceptor,
        );

        let incoming = tokio_stream::wrappers::TcpListenerStream::new(grpc_listener);
        let grpc_server = GrpcServerBuilder::new(&config.service_name)
            .build_server()
            .layer(grpc_trace_layer)
            .add_service(health.server)
            .add_service(reflection_service)
            .add_service(admin_service)
            .serve_with_incoming_shutdown(incoming, shutdown.clone().cancelled_owned())
            .boxed();

        tracing::info!(
            http_port = http_port,
            grpc_port = grpc_port,
            "Admin service listeners bound"
        );

        let state = AppState {
            config,
            admin,
            readiness: health.readiness,
            shutdown,
            requests,
        };

        Ok(Self {
            http_port,
            grpc_port,
            http_listener,
            grpc_server,
            state,
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// Get the gRPC port the server is listening on.
    pub fn grpc_port(&self) -> u16 {
        self.grpc_port
    }

    /// Handle for flipping readiness on both surfaces.
    pub fn readiness(&self) -> Readiness {
        self.state.readiness.clone()
    }

    /// Canceling this token stops both servers. In-flight requests keep
    /// running until both have drained.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.state.shutdown.clone()
    }

    /// Serve HTTP and gRPC until the shutdown token is canceled.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let Application {
            http_port,
            grpc_port,
            http_listener,
            grpc_server,
            state,
        } = self;
        let shutdown = state.shutdown.clone();
        let requests = state.requests.clone();
        let readiness = state.readiness.clone();
        let router = build_router(state);

        readiness.set_serving().await;
        tracing::info!(
            service = GRPC_SERVICE_NAME,
            version = env!("CARGO_PKG_VERSION"),
            http_port = http_port,
            grpc_port = grpc_port,
            "Service ready to accept connections"
        );

        // Whichever server stops first takes the other one down with it.
        let http = async {
            let result = axum::serve(http_listener, router)
                .with_graceful_shutdown(shutdown.clone().cancelled_owned())
                .into_future()
                .await;
            shutdown.cancel();
            result.map_err(|e| {
                tracing::error!(error = %e, "HTTP server error");
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
        };
        let grpc = async {
            let result = grpc_server.await;
            shutdown.cancel();
            result.map_err(|e| {
                tracing::error!(error = %e, "gRPC server error");
                std::io::Error::other(format!("gRPC server error: {}", e))
            })
        };

        let (http_result, grpc_result) = tokio::join!(http, grpc);

        // Both servers have drained; abandon anything still holding a context.
        requests.cancel();
        http_result.and(grpc_result)
    }
}

/// The gRPC port paired with an HTTP port. Ephemeral stays ephemeral.
pub fn grpc_port_for(http_port: u16) -> Result<u16, AppError> {
    match http_port {
        0 => Ok(0),
        port => port.checked_add(1).ok_or_else(|| {
            AppError::Internal(format!("no gRPC port available above HTTP port {}", port))
        }),
    }
}
