use super::Admin;

/// Subject details reported by the identity provider for an access token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProviderUser {
    pub username: String,
    pub email: String,
    pub phone_number: Option<String>,
}

/// Tokens issued by the identity provider.
///
/// A refresh grant may come back without a refresh token; callers keep the
/// one they already hold in that case.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthResult {
    pub id_token: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i32,
}

/// Provider session joined with the local admin ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminAuth {
    pub admin_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i32,
}

impl AdminAuth {
    pub fn new(admin: &Admin, result: AuthResult) -> Self {
        Self {
            admin_id: admin.id.clone(),
            access_token: result.access_token,
            refresh_token: result.refresh_token,
            expires_in: result.expires_in,
        }
    }
}
