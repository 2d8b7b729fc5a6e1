use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Admin;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUpAdminRequest {
    #[validate(
        length(min = 1, max = 256, message = "Email is required"),
        email(message = "Invalid email format")
    )]
    #[schema(example = "admin@example.com")]
    pub email: String,

    #[serde(default)]
    #[schema(example = "09012345678")]
    pub phone_number: String,

    #[validate(length(min = 8, max = 32, message = "Password must be 8 to 32 characters"))]
    #[schema(example = "password123", min_length = 8, max_length = 32)]
    pub password: String,

    #[validate(length(min = 1, message = "Password confirmation is required"))]
    #[schema(example = "password123")]
    pub password_confirmation: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUpAdminResponse {
    #[schema(example = "kSByoE6FetnPs5Byk3a9Zx")]
    pub admin_id: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyAdminRequest {
    #[validate(length(min = 1, message = "Admin ID is required"))]
    pub admin_id: String,

    #[validate(length(min = 1, message = "Verification code is required"))]
    #[schema(example = "123456")]
    pub verify_code: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAdminEmailRequest {
    #[validate(
        length(min = 1, max = 256, message = "Email is required"),
        email(message = "Invalid email format")
    )]
    #[schema(example = "new-admin@example.com")]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyAdminEmailRequest {
    #[validate(length(min = 1, message = "Verification code is required"))]
    #[schema(example = "123456")]
    pub verify_code: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAdminPasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub old_password: String,

    #[validate(length(min = 8, max = 32, message = "Password must be 8 to 32 characters"))]
    pub new_password: String,

    #[validate(length(min = 1, message = "Password confirmation is required"))]
    pub password_confirmation: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForgotAdminPasswordRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    #[schema(example = "admin@example.com")]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetAdminPasswordRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    #[schema(example = "admin@example.com")]
    pub email: String,

    #[validate(length(min = 1, message = "Verification code is required"))]
    #[schema(example = "123456")]
    pub verify_code: String,

    #[validate(length(min = 8, max = 32, message = "Password must be 8 to 32 characters"))]
    pub password: String,

    #[validate(length(min = 1, message = "Password confirmation is required"))]
    pub password_confirmation: String,
}

/// Public projection of an admin.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminResponse {
    pub id: String,
    /// 0 = unknown, 1 = email, 2 = oauth
    #[schema(example = 1)]
    pub provider_type: i16,
    pub email: String,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Admin> for AdminResponse {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            provider_type: admin.provider_type.as_i16(),
            email: admin.email,
            phone_number: admin.phone_number.unwrap_or_default(),
            created_at: admin.created_at,
            updated_at: admin.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminEnvelope {
    pub admin: AdminResponse,
}

impl From<Admin> for AdminEnvelope {
    fn from(admin: Admin) -> Self {
        Self {
            admin: admin.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_up(email: &str, password: &str) -> SignUpAdminRequest {
        SignUpAdminRequest {
            email: email.to_string(),
            phone_number: String::new(),
            password: password.to_string(),
            password_confirmation: password.to_string(),
        }
    }

    #[test]
    fn test_sign_up_validation() {
        assert!(sign_up("admin@example.com", "password1").validate().is_ok());
        assert!(sign_up("not-an-email", "password1").validate().is_err());
        assert!(sign_up("admin@example.com", "short").validate().is_err());
        assert!(sign_up("admin@example.com", &"p".repeat(33))
            .validate()
            .is_err());
    }

    #[test]
    fn test_sign_up_request_is_camel_case() {
        let req: SignUpAdminRequest = serde_json::from_str(
            r#"{"email":"a@x.com","password":"pw123456","passwordConfirmation":"pw123456"}"#,
        )
        .unwrap();
        assert_eq!(req.password_confirmation, "pw123456");
        assert!(req.phone_number.is_empty());
    }

    #[test]
    fn test_admin_response_shape() {
        let admin = Admin {
            id: "admin-id".to_string(),
            email: "a@x.com".to_string(),
            provider_type: crate::models::ProviderType::Email,
            ..Default::default()
        };
        let json = serde_json::to_value(AdminEnvelope::from(admin)).unwrap();
        assert_eq!(json["admin"]["id"], "admin-id");
        assert_eq!(json["admin"]["providerType"], 1);
        assert_eq!(json["admin"]["phoneNumber"], "");
        assert!(json["admin"].get("providerSubject").is_none());
    }
}
