//! gRPC service implementation for AdminService.
//!
//! Each RPC validates its input, derives a request context and delegates to
//! the shared [`AdminService`]. Failures are rendered through
//! [`IntoStatus`], so both transports agree on codes.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use service_core::error::AppError;
use service_core::grpc::{grpc_timeout, IntoStatus};
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};
use validator::Validate;

use crate::dtos::admin as dto;
use crate::dtos::auth as auth_dto;
use crate::grpc::proto::{self, admin_service_server};
use crate::models::{Admin, AdminAuth};
use crate::services::{
    record_error, record_grpc_request, record_grpc_request_duration, AdminService,
    RequestContext,
};

/// AdminService gRPC implementation.
#[derive(Clone)]
pub struct AdminServiceImpl {
    admin: AdminService,
    requests: CancellationToken,
    request_timeout: Duration,
}

impl AdminServiceImpl {
    pub fn new(
        admin: AdminService,
        requests: CancellationToken,
        request_timeout: Duration,
    ) -> Self {
        Self {
            admin,
            requests,
            request_timeout,
        }
    }

    /// Context bounded by the caller's `grpc-timeout`, never longer than the
    /// configured request timeout.
    fn context<T>(&self, request: &Request<T>) -> RequestContext {
        let timeout = grpc_timeout(request.metadata())
            .map(|t| t.min(self.request_timeout))
            .unwrap_or(self.request_timeout);
        RequestContext::from_token(&self.requests).with_timeout(timeout)
    }
}

fn require_token(access_token: &str) -> Result<(), AppError> {
    if access_token.is_empty() {
        return Err(AppError::Unauthenticated(
            "access token is required".to_string(),
        ));
    }
    Ok(())
}

fn timestamp(dt: DateTime<Utc>) -> prost_types::Timestamp {
    prost_types::Timestamp {
        seconds: dt.timestamp(),
        nanos: dt.timestamp_subsec_nanos() as i32,
    }
}

impl From<Admin> for proto::Admin {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            provider_type: i32::from(admin.provider_type.as_i16()),
            email: admin.email,
            phone_number: admin.phone_number.unwrap_or_default(),
            created_at: Some(timestamp(admin.created_at)),
            updated_at: Some(timestamp(admin.updated_at)),
            verified_at: admin.verified_at.map(timestamp),
        }
    }
}

impl From<AdminAuth> for proto::AdminAuth {
    fn from(auth: AdminAuth) -> Self {
        Self {
            admin_id: auth.admin_id,
            access_token: auth.access_token,
            refresh_token: auth.refresh_token,
            expires_in: auth.expires_in,
        }
    }
}

/// Record the outcome of one RPC and render it.
fn finish<T>(
    method: &str,
    start: Instant,
    result: Result<T, AppError>,
) -> Result<Response<T>, Status> {
    record_grpc_request_duration(method, start.elapsed().as_secs_f64());
    match result {
        Ok(body) => {
            record_grpc_request(method, "ok");
            Ok(Response::new(body))
        }
        Err(e) => {
            let kind = e.kind();
            record_grpc_request(method, kind.as_str());
            record_error(kind.as_str());
            Err(e.into_status())
        }
    }
}

impl AdminServiceImpl {
    async fn sign_up(
        &self,
        ctx: RequestContext,
        req: proto::SignUpAdminRequest,
    ) -> Result<proto::SignUpAdminResponse, AppError> {
        let req = dto::SignUpAdminRequest {
            email: req.email,
            phone_number: req.phone_number,
            password: req.password,
            password_confirmation: req.password_confirmation,
        };
        req.validate()?;
        let admin_id = self
            .admin
            .sign_up(
                &ctx,
                &req.email,
                &req.phone_number,
                &req.password,
                &req.password_confirmation,
            )
            .await?;
        Ok(proto::SignUpAdminResponse { admin_id })
    }

    async fn verify(
        &self,
        ctx: RequestContext,
        req: proto::VerifyAdminRequest,
    ) -> Result<proto::VerifyAdminResponse, AppError> {
        let req = dto::VerifyAdminRequest {
            admin_id: req.admin_id,
            verify_code: req.verify_code,
        };
        req.validate()?;
        self.admin.verify(&ctx, &req.admin_id, &req.verify_code).await?;
        Ok(proto::VerifyAdminResponse {})
    }

    async fn sign_up_with_oauth(
        &self,
        ctx: RequestContext,
        req: proto::SignUpAdminWithOAuthRequest,
    ) -> Result<proto::SignUpAdminWithOAuthResponse, AppError> {
        require_token(&req.access_token)?;
        let admin = self.admin.sign_up_with_oauth(&ctx, &req.access_token).await?;
        Ok(proto::SignUpAdminWithOAuthResponse {
            admin: Some(admin.into()),
        })
    }

    async fn get(
        &self,
        ctx: RequestContext,
        req: proto::GetAdminRequest,
    ) -> Result<proto::GetAdminResponse, AppError> {
        require_token(&req.access_token)?;
        let admin = self.admin.get_admin(&ctx, &req.access_token).await?;
        Ok(proto::GetAdminResponse {
            admin: Some(admin.into()),
        })
    }

    async fn get_by_id(
        &self,
        ctx: RequestContext,
        req: proto::GetAdminByIdRequest,
    ) -> Result<proto::GetAdminByIdResponse, AppError> {
        if req.admin_id.is_empty() {
            return Err(AppError::InvalidArgument("admin_id is required".to_string()));
        }
        let admin = self.admin.get_admin_by_id(&ctx, &req.admin_id).await?;
        Ok(proto::GetAdminByIdResponse {
            admin: Some(admin.into()),
        })
    }

    async fn update_email(
        &self,
        ctx: RequestContext,
        req: proto::UpdateAdminEmailRequest,
    ) -> Result<proto::UpdateAdminEmailResponse, AppError> {
        require_token(&req.access_token)?;
        dto::UpdateAdminEmailRequest {
            email: req.email.clone(),
        }
        .validate()?;
        self.admin
            .change_email(&ctx, &req.access_token, &req.email)
            .await?;
        Ok(proto::UpdateAdminEmailResponse {})
    }

    async fn verify_email(
        &self,
        ctx: RequestContext,
        req: proto::VerifyAdminEmailRequest,
    ) -> Result<proto::VerifyAdminEmailResponse, AppError> {
        require_token(&req.access_token)?;
        dto::VerifyAdminEmailRequest {
            verify_code: req.verify_code.clone(),
        }
        .validate()?;
        self.admin
            .confirm_email_change(&ctx, &req.access_token, &req.verify_code)
            .await?;
        Ok(proto::VerifyAdminEmailResponse {})
    }

    async fn delete(
        &self,
        ctx: RequestContext,
        req: proto::DeleteAdminRequest,
    ) -> Result<proto::DeleteAdminResponse, AppError> {
        if req.admin_id.is_empty() {
            return Err(AppError::InvalidArgument("admin_id is required".to_string()));
        }
        self.admin.delete(&ctx, &req.admin_id).await?;
        Ok(proto::DeleteAdminResponse {})
    }

    async fn update_password(
        &self,
        ctx: RequestContext,
        req: proto::UpdateAdminPasswordRequest,
    ) -> Result<proto::UpdateAdminPasswordResponse, AppError> {
        require_token(&req.access_token)?;
        let access_token = req.access_token;
        let req = dto::UpdateAdminPasswordRequest {
            old_password: req.old_password,
            new_password: req.new_password,
            password_confirmation: req.password_confirmation,
        };
        req.validate()?;
        self.admin
            .change_password(
                &ctx,
                &access_token,
                &req.old_password,
                &req.new_password,
                &req.password_confirmation,
            )
            .await?;
        Ok(proto::UpdateAdminPasswordResponse {})
    }

    async fn forgot_password(
        &self,
        ctx: RequestContext,
        req: proto::ForgotAdminPasswordRequest,
    ) -> Result<proto::ForgotAdminPasswordResponse, AppError> {
        let req = dto::ForgotAdminPasswordRequest { email: req.email };
        req.validate()?;
        self.admin.forgot_password(&ctx, &req.email).await?;
        Ok(proto::ForgotAdminPasswordResponse {})
    }

    async fn reset_password(
        &self,
        ctx: RequestContext,
        req: proto::ResetAdminPasswordRequest,
    ) -> Result<proto::ResetAdminPasswordResponse, AppError> {
        let req = dto::ResetAdminPasswordRequest {
            email: req.email,
            verify_code: req.verify_code,
            password: req.new_password,
            password_confirmation: req.password_confirmation,
        };
        req.validate()?;
        self.admin
            .reset_password(
                &ctx,
                &req.email,
                &req.verify_code,
                &req.password,
                &req.password_confirmation,
            )
            .await?;
        Ok(proto::ResetAdminPasswordResponse {})
    }

    async fn sign_in(
        &self,
        ctx: RequestContext,
        req: proto::SignInAdminRequest,
    ) -> Result<proto::SignInAdminResponse, AppError> {
        let req = auth_dto::SignInAdminRequest {
            key: req.key,
            password: req.password,
        };
        req.validate()?;
        let auth = self.admin.sign_in(&ctx, &req.key, &req.password).await?;
        Ok(proto::SignInAdminResponse {
            auth: Some(auth.into()),
        })
    }

    async fn sign_in_with_oauth(
        &self,
        ctx: RequestContext,
        req: proto::SignInAdminWithOAuthRequest,
    ) -> Result<proto::SignInAdminWithOAuthResponse, AppError> {
        require_token(&req.access_token)?;
        let auth = self.admin.sign_in_with_oauth(&ctx, &req.access_token).await?;
        Ok(proto::SignInAdminWithOAuthResponse {
            auth: Some(auth.into()),
        })
    }

    async fn sign_out(
        &self,
        ctx: RequestContext,
        req: proto::SignOutAdminRequest,
    ) -> Result<proto::SignOutAdminResponse, AppError> {
        require_token(&req.access_token)?;
        self.admin.sign_out(&ctx, &req.access_token).await?;
        Ok(proto::SignOutAdminResponse {})
    }

    async fn refresh(
        &self,
        ctx: RequestContext,
        req: proto::RefreshAdminTokenRequest,
    ) -> Result<proto::RefreshAdminTokenResponse, AppError> {
        let req = auth_dto::RefreshAdminTokenRequest {
            refresh_token: req.refresh_token,
        };
        req.validate()?;
        let auth = self.admin.refresh_token(&ctx, &req.refresh_token).await?;
        Ok(proto::RefreshAdminTokenResponse {
            auth: Some(auth.into()),
        })
    }
}

#[tonic::async_trait]
impl admin_service_server::AdminService for AdminServiceImpl {
    // =========================================================================
    // Registration
    // =========================================================================

    async fn sign_up_admin(
        &self,
        request: Request<proto::SignUpAdminRequest>,
    ) -> Result<Response<proto::SignUpAdminResponse>, Status> {
        let start = Instant::now();
        let ctx = self.context(&request);
        let result = self.sign_up(ctx, request.into_inner()).await;
        finish("SignUpAdmin", start, result)
    }

    async fn verify_admin(
        &self,
        request: Request<proto::VerifyAdminRequest>,
    ) -> Result<Response<proto::VerifyAdminResponse>, Status> {
        let start = Instant::now();
        let ctx = self.context(&request);
        let result = self.verify(ctx, request.into_inner()).await;
        finish("VerifyAdmin", start, result)
    }

    async fn sign_up_admin_with_o_auth(
        &self,
        request: Request<proto::SignUpAdminWithOAuthRequest>,
    ) -> Result<Response<proto::SignUpAdminWithOAuthResponse>, Status> {
        let start = Instant::now();
        let ctx = self.context(&request);
        let result = self.sign_up_with_oauth(ctx, request.into_inner()).await;
        finish("SignUpAdminWithOAuth", start, result)
    }

    // =========================================================================
    // Profile
    // =========================================================================

    async fn get_admin(
        &self,
        request: Request<proto::GetAdminRequest>,
    ) -> Result<Response<proto::GetAdminResponse>, Status> {
        let start = Instant::now();
        let ctx = self.context(&request);
        let result = self.get(ctx, request.into_inner()).await;
        finish("GetAdmin", start, result)
    }

    async fn get_admin_by_id(
        &self,
        request: Request<proto::GetAdminByIdRequest>,
    ) -> Result<Response<proto::GetAdminByIdResponse>, Status> {
        let start = Instant::now();
        let ctx = self.context(&request);
        let result = self.get_by_id(ctx, request.into_inner()).await;
        finish("GetAdminById", start, result)
    }

    async fn update_admin_email(
        &self,
        request: Request<proto::UpdateAdminEmailRequest>,
    ) -> Result<Response<proto::UpdateAdminEmailResponse>, Status> {
        let start = Instant::now();
        let ctx = self.context(&request);
        let result = self.update_email(ctx, request.into_inner()).await;
        finish("UpdateAdminEmail", start, result)
    }

    async fn verify_admin_email(
        &self,
        request: Request<proto::VerifyAdminEmailRequest>,
    ) -> Result<Response<proto::VerifyAdminEmailResponse>, Status> {
        let start = Instant::now();
        let ctx = self.context(&request);
        let result = self.verify_email(ctx, request.into_inner()).await;
        finish("VerifyAdminEmail", start, result)
    }

    async fn delete_admin(
        &self,
        request: Request<proto::DeleteAdminRequest>,
    ) -> Result<Response<proto::DeleteAdminResponse>, Status> {
        let start = Instant::now();
        let ctx = self.context(&request);
        let result = self.delete(ctx, request.into_inner()).await;
        finish("DeleteAdmin", start, result)
    }

    // =========================================================================
    // Password
    // =========================================================================

    async fn update_admin_password(
        &self,
        request: Request<proto::UpdateAdminPasswordRequest>,
    ) -> Result<Response<proto::UpdateAdminPasswordResponse>, Status> {
        let start = Instant::now();
        let ctx = self.context(&request);
        let result = self.update_password(ctx, request.into_inner()).await;
        finish("UpdateAdminPassword", start, result)
    }

    async fn forgot_admin_password(
        &self,
        request: Request<proto::ForgotAdminPasswordRequest>,
    ) -> Result<Response<proto::ForgotAdminPasswordResponse>, Status> {
        let start = Instant::now();
        let ctx = self.context(&request);
        let result = self.forgot_password(ctx, request.into_inner()).await;
        finish("ForgotAdminPassword", start, result)
    }

    async fn reset_admin_password(
        &self,
        request: Request<proto::ResetAdminPasswordRequest>,
    ) -> Result<Response<proto::ResetAdminPasswordResponse>, Status> {
        let start = Instant::now();
        let ctx = self.context(&request);
        let result = self.reset_password(ctx, request.into_inner()).await;
        finish("ResetAdminPassword", start, result)
    }

    // =========================================================================
    // Session
    // =========================================================================

    async fn sign_in_admin(
        &self,
        request: Request<proto::SignInAdminRequest>,
    ) -> Result<Response<proto::SignInAdminResponse>, Status> {
        let start = Instant::now();
        let ctx = self.context(&request);
        let result = self.sign_in(ctx, request.into_inner()).await;
        finish("SignInAdmin", start, result)
    }

    async fn sign_in_admin_with_o_auth(
        &self,
        request: Request<proto::SignInAdminWithOAuthRequest>,
    ) -> Result<Response<proto::SignInAdminWithOAuthResponse>, Status> {
        let start = Instant::now();
        let ctx = self.context(&request);
        let result = self.sign_in_with_oauth(ctx, request.into_inner()).await;
        finish("SignInAdminWithOAuth", start, result)
    }

    async fn sign_out_admin(
        &self,
        request: Request<proto::SignOutAdminRequest>,
    ) -> Result<Response<proto::SignOutAdminResponse>, Status> {
        let start = Instant::now();
        let ctx = self.context(&request);
        let result = self.sign_out(ctx, request.into_inner()).await;
        finish("SignOutAdmin", start, result)
    }

    async fn refresh_admin_token(
        &self,
        request: Request<proto::RefreshAdminTokenRequest>,
    ) -> Result<Response<proto::RefreshAdminTokenResponse>, Status> {
        let start = Instant::now();
        let ctx = self.context(&request);
        let result = self.refresh(ctx, request.into_inner()).await;
        finish("RefreshAdminToken", start, result)
    }
}
