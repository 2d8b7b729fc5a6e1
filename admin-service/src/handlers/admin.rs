//! `/admin` routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use super::observe;
use crate::dtos::admin::{
    AdminEnvelope, ForgotAdminPasswordRequest, ResetAdminPasswordRequest, SignUpAdminRequest,
    SignUpAdminResponse, UpdateAdminEmailRequest, UpdateAdminPasswordRequest,
    VerifyAdminEmailRequest, VerifyAdminRequest,
};
use crate::middleware::BearerToken;
use crate::services::RequestContext;
use crate::utils::ValidatedJson;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/admin",
    request_body = SignUpAdminRequest,
    responses(
        (status = 200, description = "Admin registered, or already registered", body = SignUpAdminResponse),
        (status = 400, description = "Invalid request", body = crate::dtos::ErrorResponse),
        (status = 429, description = "Provider throttled the request", body = crate::dtos::ErrorResponse)
    ),
    tag = "Admin"
)]
pub async fn sign_up_admin(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidatedJson(req): ValidatedJson<SignUpAdminRequest>,
) -> Result<Json<SignUpAdminResponse>, AppError> {
    let admin_id = observe(
        state
            .admin
            .sign_up(
                &ctx,
                &req.email,
                &req.phone_number,
                &req.password,
                &req.password_confirmation,
            )
            .await,
    )?;
    Ok(Json(SignUpAdminResponse { admin_id }))
}

#[utoipa::path(
    post,
    path = "/admin/verified",
    request_body = VerifyAdminRequest,
    responses(
        (status = 204, description = "Admin verified"),
        (status = 400, description = "Invalid verification code", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Admin not found", body = crate::dtos::ErrorResponse),
        (status = 412, description = "Admin already verified", body = crate::dtos::ErrorResponse)
    ),
    tag = "Admin"
)]
pub async fn verify_admin(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidatedJson(req): ValidatedJson<VerifyAdminRequest>,
) -> Result<StatusCode, AppError> {
    observe(
        state
            .admin
            .verify(&ctx, &req.admin_id, &req.verify_code)
            .await,
    )?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/admin/oauth",
    responses(
        (status = 200, description = "Admin registered", body = AdminEnvelope),
        (status = 401, description = "Missing or invalid access token", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn sign_up_admin_with_oauth(
    State(state): State<AppState>,
    ctx: RequestContext,
    BearerToken(token): BearerToken,
) -> Result<Json<AdminEnvelope>, AppError> {
    let admin = observe(state.admin.sign_up_with_oauth(&ctx, &token).await)?;
    Ok(Json(admin.into()))
}

#[utoipa::path(
    get,
    path = "/admin/{admin_id}",
    params(("admin_id" = String, Path, description = "Admin ID")),
    responses(
        (status = 200, description = "Admin found", body = AdminEnvelope),
        (status = 404, description = "Admin not found", body = crate::dtos::ErrorResponse)
    ),
    tag = "Admin"
)]
pub async fn get_admin(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(admin_id): Path<String>,
) -> Result<Json<AdminEnvelope>, AppError> {
    let admin = observe(state.admin.get_admin_by_id(&ctx, &admin_id).await)?;
    Ok(Json(admin.into()))
}

#[utoipa::path(
    put,
    path = "/admin/email",
    request_body = UpdateAdminEmailRequest,
    responses(
        (status = 204, description = "Verification code sent to the new address"),
        (status = 401, description = "Missing or invalid access token", body = crate::dtos::ErrorResponse),
        (status = 412, description = "Admin does not sign in with email", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_admin_email(
    State(state): State<AppState>,
    ctx: RequestContext,
    BearerToken(token): BearerToken,
    ValidatedJson(req): ValidatedJson<UpdateAdminEmailRequest>,
) -> Result<StatusCode, AppError> {
    observe(state.admin.change_email(&ctx, &token, &req.email).await)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/admin/email/verified",
    request_body = VerifyAdminEmailRequest,
    responses(
        (status = 204, description = "Email changed"),
        (status = 400, description = "Invalid verification code", body = crate::dtos::ErrorResponse),
        (status = 401, description = "Missing or invalid access token", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn verify_admin_email(
    State(state): State<AppState>,
    ctx: RequestContext,
    BearerToken(token): BearerToken,
    ValidatedJson(req): ValidatedJson<VerifyAdminEmailRequest>,
) -> Result<StatusCode, AppError> {
    observe(
        state
            .admin
            .confirm_email_change(&ctx, &token, &req.verify_code)
            .await,
    )?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/admin/password",
    request_body = UpdateAdminPasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Invalid request", body = crate::dtos::ErrorResponse),
        (status = 401, description = "Wrong password or invalid access token", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_admin_password(
    State(state): State<AppState>,
    ctx: RequestContext,
    BearerToken(token): BearerToken,
    ValidatedJson(req): ValidatedJson<UpdateAdminPasswordRequest>,
) -> Result<StatusCode, AppError> {
    observe(
        state
            .admin
            .change_password(
                &ctx,
                &token,
                &req.old_password,
                &req.new_password,
                &req.password_confirmation,
            )
            .await,
    )?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/admin/password/forgot",
    request_body = ForgotAdminPasswordRequest,
    responses(
        (status = 204, description = "Reset code sent"),
        (status = 404, description = "Admin not found", body = crate::dtos::ErrorResponse)
    ),
    tag = "Admin"
)]
pub async fn forgot_admin_password(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidatedJson(req): ValidatedJson<ForgotAdminPasswordRequest>,
) -> Result<StatusCode, AppError> {
    observe(state.admin.forgot_password(&ctx, &req.email).await)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/admin/password/reset",
    request_body = ResetAdminPasswordRequest,
    responses(
        (status = 204, description = "Password reset"),
        (status = 400, description = "Invalid request or code", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Admin not found", body = crate::dtos::ErrorResponse)
    ),
    tag = "Admin"
)]
pub async fn reset_admin_password(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidatedJson(req): ValidatedJson<ResetAdminPasswordRequest>,
) -> Result<StatusCode, AppError> {
    observe(
        state
            .admin
            .reset_password(
                &ctx,
                &req.email,
                &req.verify_code,
                &req.password,
                &req.password_confirmation,
            )
            .await,
    )?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/admin/{admin_id}",
    params(("admin_id" = String, Path, description = "Admin ID")),
    responses(
        (status = 204, description = "Admin deleted, or already absent"),
        (status = 500, description = "Provider deletion failed", body = crate::dtos::ErrorResponse)
    ),
    tag = "Admin"
)]
pub async fn delete_admin(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(admin_id): Path<String>,
) -> Result<StatusCode, AppError> {
    observe(state.admin.delete(&ctx, &admin_id).await)?;
    Ok(StatusCode::NO_CONTENT)
}
