//! Common test utilities for admin-service integration tests.
#![allow(dead_code)]

use admin_service::build_router;
use admin_service::config::{AdminConfig, CognitoConfig, DatabaseConfig};
use admin_service::grpc::proto::admin_service_client::AdminServiceClient;
use admin_service::services::{AdminService, MemoryAdminStore, MockAdminAuth};
use admin_service::startup::{Application, GRPC_SERVICE_NAME};
use admin_service::AppState;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use service_core::config::Config as CommonConfig;
use service_core::grpc::Readiness;
use std::sync::{Arc, Once};
use tokio_util::sync::CancellationToken;
use tonic::transport::Channel;
use tower::ServiceExt;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,admin_service=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Configuration on ephemeral ports. Database and Cognito settings are never
/// dialed by the in-memory harness.
pub fn test_config() -> AdminConfig {
    AdminConfig {
        common: CommonConfig {
            port: 0,
            request_timeout_secs: 5,
            shutdown_delay_secs: 0,
        },
        service_name: "admin-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: std::env::var("TEST_DATABASE_URL").unwrap_or_default(),
            max_connections: 2,
            min_connections: 1,
        },
        cognito: CognitoConfig {
            region: "ap-northeast-1".to_string(),
            user_pool_id: "test-pool".to_string(),
            client_id: "test-client".to_string(),
        },
    }
}

/// Router over an in-memory store and mock provider, for `oneshot` tests.
pub struct TestRouter {
    pub router: Router,
    pub provider: Arc<MockAdminAuth>,
    pub store: Arc<MemoryAdminStore>,
    pub readiness: Readiness,
    pub shutdown: CancellationToken,
    pub requests: CancellationToken,
}

pub fn test_router() -> TestRouter {
    init_tracing();

    let provider = Arc::new(MockAdminAuth::new());
    let store = Arc::new(MemoryAdminStore::new());
    let readiness = Readiness::new(GRPC_SERVICE_NAME).readiness;
    let shutdown = CancellationToken::new();
    let requests = CancellationToken::new();
    let state = AppState {
        config: test_config(),
        admin: AdminService::new(store.clone(), provider.clone()),
        readiness: readiness.clone(),
        shutdown: shutdown.clone(),
        requests: requests.clone(),
    };

    TestRouter {
        router: build_router(state),
        provider,
        store,
        readiness,
        shutdown,
        requests,
    }
}

/// Send one request and decode the JSON body (`Null` when empty).
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

/// Test application wrapper.
pub struct TestApp {
    pub grpc_client: AdminServiceClient<Channel>,
    pub provider: Arc<MockAdminAuth>,
    pub store: Arc<MemoryAdminStore>,
    pub http_port: u16,
    pub grpc_port: u16,
    pub readiness: Readiness,
    pub shutdown: CancellationToken,
}

/// Spawn the full application on ephemeral ports and connect a gRPC client.
pub async fn spawn_app() -> TestApp {
    init_tracing();

    let provider = Arc::new(MockAdminAuth::new());
    let store = Arc::new(MemoryAdminStore::new());
    let app = Application::from_parts(test_config(), store.clone(), provider.clone())
        .await
        .expect("Failed to build application");

    let http_port = app.http_port();
    let grpc_port = app.grpc_port();
    let readiness = app.readiness();
    let shutdown = app.shutdown_token();
    let grpc_addr = format!("http://127.0.0.1:{}", grpc_port);

    tokio::spawn(async move {
        app.run_until_stopped().await.ok();
    });

    // Wait for server to be ready with retry
    let grpc_client = {
        let mut attempts = 0;
        loop {
            match AdminServiceClient::connect(grpc_addr.clone()).await {
                Ok(client) => break client,
                Err(_) if attempts < 20 => {
                    attempts += 1;
                    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
                }
                Err(e) => panic!("Failed to connect gRPC client after 20 attempts: {}", e),
            }
        }
    };

    TestApp {
        grpc_client,
        provider,
        store,
        http_port,
        grpc_port,
        readiness,
        shutdown,
    }
}
