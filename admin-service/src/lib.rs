//! Admin Service - administrator identities backed by a Cognito user pool.

pub mod config;
pub mod dtos;
pub mod grpc;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    middleware::from_fn,
    routing::{get, post, put},
    Json, Router,
};
use service_core::grpc::Readiness;
use service_core::middleware::{metrics::metrics_middleware, tracing::request_id_middleware};
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::config::AdminConfig;
use crate::services::AdminService;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health_check,
        handlers::readiness_check,
        handlers::admin::sign_up_admin,
        handlers::admin::verify_admin,
        handlers::admin::sign_up_admin_with_oauth,
        handlers::admin::get_admin,
        handlers::admin::update_admin_email,
        handlers::admin::verify_admin_email,
        handlers::admin::update_admin_password,
        handlers::admin::forgot_admin_password,
        handlers::admin::reset_admin_password,
        handlers::admin::delete_admin,
        handlers::auth::sign_in_admin,
        handlers::auth::sign_out_admin,
        handlers::auth::get_admin_auth,
        handlers::auth::refresh_admin_token,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::admin::SignUpAdminRequest,
            dtos::admin::SignUpAdminResponse,
            dtos::admin::VerifyAdminRequest,
            dtos::admin::UpdateAdminEmailRequest,
            dtos::admin::VerifyAdminEmailRequest,
            dtos::admin::UpdateAdminPasswordRequest,
            dtos::admin::ForgotAdminPasswordRequest,
            dtos::admin::ResetAdminPasswordRequest,
            dtos::admin::AdminResponse,
            dtos::admin::AdminEnvelope,
            dtos::auth::SignInAdminRequest,
            dtos::auth::RefreshAdminTokenRequest,
            dtos::auth::AdminAuthResponse,
            dtos::auth::AdminAuthEnvelope,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Admin", description = "Admin registration and profile"),
        (name = "Admin Auth", description = "Admin sessions"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: AdminConfig,
    pub admin: AdminService,
    pub readiness: Readiness,
    /// Stops accepting connections and drains both servers.
    pub shutdown: CancellationToken,
    /// Parent of every request context; canceled only after both servers drained.
    pub requests: CancellationToken,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_handler))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route("/admin", post(handlers::admin::sign_up_admin))
        .route("/admin/verified", post(handlers::admin::verify_admin))
        .route(
            "/admin/oauth",
            post(handlers::admin::sign_up_admin_with_oauth),
        )
        .route("/admin/email", put(handlers::admin::update_admin_email))
        .route(
            "/admin/email/verified",
            post(handlers::admin::verify_admin_email),
        )
        .route(
            "/admin/password",
            put(handlers::admin::update_admin_password),
        )
        .route(
            "/admin/password/forgot",
            post(handlers::admin::forgot_admin_password),
        )
        .route(
            "/admin/password/reset",
            put(handlers::admin::reset_admin_password),
        )
        .route(
            "/admin/auth",
            post(handlers::auth::sign_in_admin)
                .get(handlers::auth::get_admin_auth)
                .delete(handlers::auth::sign_out_admin),
        )
        .route(
            "/admin/auth/refresh",
            post(handlers::auth::refresh_admin_token),
        )
        .route(
            "/admin/:admin_id",
            get(handlers::admin::get_admin).delete(handlers::admin::delete_admin),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}
