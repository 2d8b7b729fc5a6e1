//! Credential provider contract and an in-process implementation.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::context::RequestContext;
use super::error::ProviderError;
use crate::models::{AuthResult, ProviderUser};

/// The external identity system that owns credentials and sessions.
///
/// Subjects are addressed by the username they were registered under, which
/// for email sign-ups is the locally generated provider subject.
#[async_trait]
pub trait AdminAuthProvider: Send + Sync {
    async fn sign_up(
        &self,
        ctx: &RequestContext,
        username: &str,
        email: &str,
        phone_number: &str,
        password: &str,
    ) -> Result<(), ProviderError>;

    async fn confirm_sign_up(
        &self,
        ctx: &RequestContext,
        username: &str,
        code: &str,
    ) -> Result<(), ProviderError>;

    async fn get_user(
        &self,
        ctx: &RequestContext,
        access_token: &str,
    ) -> Result<ProviderUser, ProviderError>;

    async fn get_username(
        &self,
        ctx: &RequestContext,
        access_token: &str,
    ) -> Result<String, ProviderError>;

    async fn sign_in(
        &self,
        ctx: &RequestContext,
        key: &str,
        password: &str,
    ) -> Result<AuthResult, ProviderError>;

    async fn sign_out(&self, ctx: &RequestContext, access_token: &str)
        -> Result<(), ProviderError>;

    /// Exchange a refresh token. The returned refresh token is empty when the
    /// provider does not rotate it.
    async fn refresh_token(
        &self,
        ctx: &RequestContext,
        refresh_token: &str,
    ) -> Result<AuthResult, ProviderError>;

    /// Start an email change. The provider sends a code to `new_email`.
    async fn change_email(
        &self,
        ctx: &RequestContext,
        access_token: &str,
        username: &str,
        old_email: &str,
        new_email: &str,
    ) -> Result<(), ProviderError>;

    /// Confirm a pending email change and return the confirmed address.
    async fn confirm_change_email(
        &self,
        ctx: &RequestContext,
        access_token: &str,
        username: &str,
        code: &str,
    ) -> Result<String, ProviderError>;

    async fn change_password(
        &self,
        ctx: &RequestContext,
        access_token: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ProviderError>;

    async fn forgot_password(&self, ctx: &RequestContext, username: &str)
        -> Result<(), ProviderError>;

    async fn confirm_forgot_password(
        &self,
        ctx: &RequestContext,
        username: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), ProviderError>;

    async fn delete_user(&self, ctx: &RequestContext, username: &str)
        -> Result<(), ProviderError>;
}

/// Operation names used by [`MockAdminAuth`] for call counting and failure
/// injection.
pub mod ops {
    pub const SIGN_UP: &str = "sign_up";
    pub const CONFIRM_SIGN_UP: &str = "confirm_sign_up";
    pub const GET_USER: &str = "get_user";
    pub const GET_USERNAME: &str = "get_username";
    pub const SIGN_IN: &str = "sign_in";
    pub const SIGN_OUT: &str = "sign_out";
    pub const REFRESH_TOKEN: &str = "refresh_token";
    pub const CHANGE_EMAIL: &str = "change_email";
    pub const CONFIRM_CHANGE_EMAIL: &str = "confirm_change_email";
    pub const CHANGE_PASSWORD: &str = "change_password";
    pub const FORGOT_PASSWORD: &str = "forgot_password";
    pub const CONFIRM_FORGOT_PASSWORD: &str = "confirm_forgot_password";
    pub const DELETE_USER: &str = "delete_user";
}

#[derive(Debug, Clone)]
struct MockUser {
    email: String,
    phone_number: String,
    password: String,
    confirmed: bool,
    pending_email: Option<String>,
    reset_requested: bool,
}

#[derive(Default)]
struct MockState {
    users: HashMap<String, MockUser>,
    access_tokens: HashMap<String, String>,
    refresh_tokens: HashMap<String, String>,
    failures: HashMap<String, ProviderError>,
    calls: HashMap<String, usize>,
    issued: u64,
}

impl MockState {
    fn issue(&mut self, username: &str) -> AuthResult {
        self.issued += 1;
        let access_token = format!("access-{}-{}", username, self.issued);
        let refresh_token = format!("refresh-{}-{}", username, self.issued);
        self.access_tokens
            .insert(access_token.clone(), username.to_string());
        self.refresh_tokens
            .insert(refresh_token.clone(), username.to_string());
        AuthResult {
            id_token: format!("id-{}-{}", username, self.issued),
            access_token,
            refresh_token,
            expires_in: MockAdminAuth::EXPIRES_IN,
        }
    }

    fn username_for(&self, access_token: &str) -> Result<String, ProviderError> {
        self.access_tokens
            .get(access_token)
            .cloned()
            .ok_or_else(|| ProviderError::Unauthenticated("invalid access token".to_string()))
    }

    fn user_mut(&mut self, username: &str) -> Result<&mut MockUser, ProviderError> {
        self.users
            .get_mut(username)
            .ok_or_else(|| ProviderError::NotFound(format!("user {} does not exist", username)))
    }
}

/// In-process provider for tests and local runs.
///
/// Every call is counted per operation. A failure registered with
/// [`MockAdminAuth::fail_on`] is returned by that operation until cleared.
/// Verification codes are accepted only when they equal
/// [`MockAdminAuth::VALID_CODE`].
#[derive(Default)]
pub struct MockAdminAuth {
    state: Mutex<MockState>,
}

impl MockAdminAuth {
    pub const VALID_CODE: &'static str = "123456";
    pub const EXPIRES_IN: i32 = 3600;

    pub fn new() -> Self {
        Self::default()
    }

    /// Make `op` fail with `err` until [`MockAdminAuth::clear_failures`].
    pub async fn fail_on(&self, op: &str, err: ProviderError) {
        self.state.lock().await.failures.insert(op.to_string(), err);
    }

    pub async fn clear_failures(&self) {
        self.state.lock().await.failures.clear();
    }

    /// Number of times `op` was invoked, including failed invocations.
    pub async fn calls(&self, op: &str) -> usize {
        self.state.lock().await.calls.get(op).copied().unwrap_or(0)
    }

    /// Register a user directly, as if it signed up out of band.
    pub async fn add_user(&self, username: &str, email: &str, password: &str, confirmed: bool) {
        self.state.lock().await.users.insert(
            username.to_string(),
            MockUser {
                email: email.to_string(),
                phone_number: String::new(),
                password: password.to_string(),
                confirmed,
                pending_email: None,
                reset_requested: false,
            },
        );
    }

    /// Issue a session for `username` without a password check.
    pub async fn issue_session(&self, username: &str) -> AuthResult {
        self.state.lock().await.issue(username)
    }

    pub async fn user_exists(&self, username: &str) -> bool {
        self.state.lock().await.users.contains_key(username)
    }

    pub async fn is_confirmed(&self, username: &str) -> bool {
        self.state
            .lock()
            .await
            .users
            .get(username)
            .map(|u| u.confirmed)
            .unwrap_or(false)
    }

    /// Count the call and return the injected failure, if any.
    async fn enter(&self, ctx: &RequestContext, op: &str) -> Result<(), ProviderError> {
        let mut state = self.state.lock().await;
        *state.calls.entry(op.to_string()).or_default() += 1;
        if let Some(err) = ctx.err() {
            return Err(err.into());
        }
        match state.failures.get(op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn check_code(code: &str) -> Result<(), ProviderError> {
    if code == MockAdminAuth::VALID_CODE {
        Ok(())
    } else {
        Err(ProviderError::InvalidArgument(
            "invalid verification code provided".to_string(),
        ))
    }
}

#[async_trait]
impl AdminAuthProvider for MockAdminAuth {
    async fn sign_up(
        &self,
        ctx: &RequestContext,
        username: &str,
        email: &str,
        phone_number: &str,
        password: &str,
    ) -> Result<(), ProviderError> {
        self.enter(ctx, ops::SIGN_UP).await?;
        let mut state = self.state.lock().await;
        if state.users.contains_key(username) {
            return Err(ProviderError::AlreadyExists(
                "user already exists".to_string(),
            ));
        }
        state.users.insert(
            username.to_string(),
            MockUser {
                email: email.to_string(),
                phone_number: phone_number.to_string(),
                password: password.to_string(),
                confirmed: false,
                pending_email: None,
                reset_requested: false,
            },
        );
        Ok(())
    }

    async fn confirm_sign_up(
        &self,
        ctx: &RequestContext,
        username: &str,
        code: &str,
    ) -> Result<(), ProviderError> {
        self.enter(ctx, ops::CONFIRM_SIGN_UP).await?;
        let mut state = self.state.lock().await;
        let user = state.user_mut(username)?;
        check_code(code)?;
        user.confirmed = true;
        Ok(())
    }

    async fn get_user(
        &self,
        ctx: &RequestContext,
        access_token: &str,
    ) -> Result<ProviderUser, ProviderError> {
        self.enter(ctx, ops::GET_USER).await?;
        let mut state = self.state.lock().await;
        let username = state.username_for(access_token)?;
        let user = state.user_mut(&username)?;
        Ok(ProviderUser {
            username,
            email: user.email.clone(),
            phone_number: Some(user.phone_number.clone()).filter(|p| !p.is_empty()),
        })
    }

    async fn get_username(
        &self,
        ctx: &RequestContext,
        access_token: &str,
    ) -> Result<String, ProviderError> {
        self.enter(ctx, ops::GET_USERNAME).await?;
        self.state.lock().await.username_for(access_token)
    }

    async fn sign_in(
        &self,
        ctx: &RequestContext,
        key: &str,
        password: &str,
    ) -> Result<AuthResult, ProviderError> {
        self.enter(ctx, ops::SIGN_IN).await?;
        let mut state = self.state.lock().await;
        let found = state
            .users
            .iter()
            .find(|(username, user)| username.as_str() == key || user.email == key)
            .map(|(username, user)| (username.clone(), user.clone()));

        let (username, user) = match found {
            Some(found) if found.1.password == password => found,
            _ => {
                return Err(ProviderError::Unauthenticated(
                    "incorrect username or password".to_string(),
                ))
            }
        };
        if !user.confirmed {
            return Err(ProviderError::Unauthenticated(
                "user is not confirmed".to_string(),
            ));
        }
        Ok(state.issue(&username))
    }

    async fn sign_out(
        &self,
        ctx: &RequestContext,
        access_token: &str,
    ) -> Result<(), ProviderError> {
        self.enter(ctx, ops::SIGN_OUT).await?;
        let mut state = self.state.lock().await;
        let username = state.username_for(access_token)?;
        state.access_tokens.retain(|_, owner| *owner != username);
        state.refresh_tokens.retain(|_, owner| *owner != username);
        Ok(())
    }

    async fn refresh_token(
        &self,
        ctx: &RequestContext,
        refresh_token: &str,
    ) -> Result<AuthResult, ProviderError> {
        self.enter(ctx, ops::REFRESH_TOKEN).await?;
        let mut state = self.state.lock().await;
        let username = state
            .refresh_tokens
            .get(refresh_token)
            .cloned()
            .ok_or_else(|| ProviderError::Unauthenticated("invalid refresh token".to_string()))?;

        let mut issued = state.issue(&username);
        // Refresh tokens are not rotated.
        state.refresh_tokens.remove(&issued.refresh_token);
        issued.refresh_token = String::new();
        Ok(issued)
    }

    async fn change_email(
        &self,
        ctx: &RequestContext,
        access_token: &str,
        username: &str,
        old_email: &str,
        new_email: &str,
    ) -> Result<(), ProviderError> {
        self.enter(ctx, ops::CHANGE_EMAIL).await?;
        let mut state = self.state.lock().await;
        if state.username_for(access_token)? != username {
            return Err(ProviderError::Unauthenticated(
                "access token does not belong to user".to_string(),
            ));
        }
        let user = state.user_mut(username)?;
        if user.email != old_email {
            return Err(ProviderError::InvalidArgument(
                "current email does not match".to_string(),
            ));
        }
        user.pending_email = Some(new_email.to_string());
        Ok(())
    }

    async fn confirm_change_email(
        &self,
        ctx: &RequestContext,
        access_token: &str,
        username: &str,
        code: &str,
    ) -> Result<String, ProviderError> {
        self.enter(ctx, ops::CONFIRM_CHANGE_EMAIL).await?;
        let mut state = self.state.lock().await;
        if state.username_for(access_token)? != username {
            return Err(ProviderError::Unauthenticated(
                "access token does not belong to user".to_string(),
            ));
        }
        let user = state.user_mut(username)?;
        check_code(code)?;
        let email = user.pending_email.take().ok_or_else(|| {
            ProviderError::InvalidArgument("no email change is pending".to_string())
        })?;
        user.email = email.clone();
        Ok(email)
    }

    async fn change_password(
        &self,
        ctx: &RequestContext,
        access_token: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ProviderError> {
        self.enter(ctx, ops::CHANGE_PASSWORD).await?;
        let mut state = self.state.lock().await;
        let username = state.username_for(access_token)?;
        let user = state.user_mut(&username)?;
        if user.password != old_password {
            return Err(ProviderError::Unauthenticated(
                "incorrect username or password".to_string(),
            ));
        }
        user.password = new_password.to_string();
        Ok(())
    }

    async fn forgot_password(
        &self,
        ctx: &RequestContext,
        username: &str,
    ) -> Result<(), ProviderError> {
        self.enter(ctx, ops::FORGOT_PASSWORD).await?;
        let mut state = self.state.lock().await;
        state.user_mut(username)?.reset_requested = true;
        Ok(())
    }

    async fn confirm_forgot_password(
        &self,
        ctx: &RequestContext,
        username: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), ProviderError> {
        self.enter(ctx, ops::CONFIRM_FORGOT_PASSWORD).await?;
        let mut state = self.state.lock().await;
        let user = state.user_mut(username)?;
        if !user.reset_requested {
            return Err(ProviderError::InvalidArgument(
                "no password reset is pending".to_string(),
            ));
        }
        check_code(code)?;
        user.password = new_password.to_string();
        user.reset_requested = false;
        Ok(())
    }

    async fn delete_user(
        &self,
        ctx: &RequestContext,
        username: &str,
    ) -> Result<(), ProviderError> {
        self.enter(ctx, ops::DELETE_USER).await?;
        let mut state = self.state.lock().await;
        if state.users.remove(username).is_none() {
            return Err(ProviderError::NotFound(format!(
                "user {} does not exist",
                username
            )));
        }
        state.access_tokens.retain(|_, owner| owner.as_str() != username);
        state.refresh_tokens.retain(|_, owner| owner.as_str() != username);
        Ok(())
    }
}
