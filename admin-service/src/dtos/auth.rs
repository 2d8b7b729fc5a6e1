use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::AdminAuth;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInAdminRequest {
    /// Email address or provider username.
    #[validate(length(min = 1, message = "Key is required"))]
    #[schema(example = "admin@example.com")]
    pub key: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "password123")]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshAdminTokenRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminAuthResponse {
    pub admin_id: String,
    pub access_token: String,
    pub refresh_token: String,
    #[schema(example = 3600)]
    pub expires_in: i32,
}

impl From<AdminAuth> for AdminAuthResponse {
    fn from(auth: AdminAuth) -> Self {
        Self {
            admin_id: auth.admin_id,
            access_token: auth.access_token,
            refresh_token: auth.refresh_token,
            expires_in: auth.expires_in,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminAuthEnvelope {
    pub auth: AdminAuthResponse,
}

impl From<AdminAuth> for AdminAuthEnvelope {
    fn from(auth: AdminAuth) -> Self {
        Self { auth: auth.into() }
    }
}
