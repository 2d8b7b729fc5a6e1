//! `/admin/auth` routes.

use axum::{extract::State, http::StatusCode, Json};
use service_core::error::AppError;

use super::observe;
use crate::dtos::auth::{AdminAuthEnvelope, RefreshAdminTokenRequest, SignInAdminRequest};
use crate::middleware::BearerToken;
use crate::services::RequestContext;
use crate::utils::ValidatedJson;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/admin/auth",
    request_body = SignInAdminRequest,
    responses(
        (status = 200, description = "Signed in", body = AdminAuthEnvelope),
        (status = 401, description = "Wrong key or password", body = crate::dtos::ErrorResponse)
    ),
    tag = "Admin Auth"
)]
pub async fn sign_in_admin(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidatedJson(req): ValidatedJson<SignInAdminRequest>,
) -> Result<Json<AdminAuthEnvelope>, AppError> {
    let auth = observe(state.admin.sign_in(&ctx, &req.key, &req.password).await)?;
    Ok(Json(auth.into()))
}

#[utoipa::path(
    delete,
    path = "/admin/auth",
    responses(
        (status = 204, description = "Signed out"),
        (status = 401, description = "Missing or invalid access token", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin Auth"
)]
pub async fn sign_out_admin(
    State(state): State<AppState>,
    ctx: RequestContext,
    BearerToken(token): BearerToken,
) -> Result<StatusCode, AppError> {
    observe(state.admin.sign_out(&ctx, &token).await)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Session for an access token obtained out of band (OAuth sign-in).
#[utoipa::path(
    get,
    path = "/admin/auth",
    responses(
        (status = 200, description = "Session resolved", body = AdminAuthEnvelope),
        (status = 401, description = "Missing or invalid access token", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin Auth"
)]
pub async fn get_admin_auth(
    State(state): State<AppState>,
    ctx: RequestContext,
    BearerToken(token): BearerToken,
) -> Result<Json<AdminAuthEnvelope>, AppError> {
    let auth = observe(state.admin.sign_in_with_oauth(&ctx, &token).await)?;
    Ok(Json(auth.into()))
}

#[utoipa::path(
    post,
    path = "/admin/auth/refresh",
    request_body = RefreshAdminTokenRequest,
    responses(
        (status = 200, description = "Session refreshed", body = AdminAuthEnvelope),
        (status = 401, description = "Invalid refresh token", body = crate::dtos::ErrorResponse)
    ),
    tag = "Admin Auth"
)]
pub async fn refresh_admin_token(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidatedJson(req): ValidatedJson<RefreshAdminTokenRequest>,
) -> Result<Json<AdminAuthEnvelope>, AppError> {
    let auth = observe(state.admin.refresh_token(&ctx, &req.refresh_token).await)?;
    Ok(Json(auth.into()))
}
