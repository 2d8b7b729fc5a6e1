//! Amazon Cognito user pool as the credential provider.

use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_cognitoidentityprovider::types::{AttributeType, AuthFlowType};
use aws_sdk_cognitoidentityprovider::Client;
use std::future::Future;

use super::context::RequestContext;
use super::error::ProviderError;
use super::metrics::record_provider_request;
use super::provider::{ops, AdminAuthProvider};
use crate::config::CognitoConfig;
use crate::models::{AuthResult, ProviderUser};

const EMAIL_ATTRIBUTE: &str = "email";
const PHONE_NUMBER_ATTRIBUTE: &str = "phone_number";

/// Map a Cognito service error code onto the provider error taxonomy.
pub fn classify_code(code: Option<&str>, message: String) -> ProviderError {
    match code {
        Some(
            "InvalidParameterException"
            | "InvalidPasswordException"
            | "CodeMismatchException"
            | "ExpiredCodeException",
        ) => ProviderError::InvalidArgument(message),
        Some(
            "NotAuthorizedException"
            | "UserNotConfirmedException"
            | "PasswordResetRequiredException",
        ) => ProviderError::Unauthenticated(message),
        Some("UserNotFoundException" | "ResourceNotFoundException") => {
            ProviderError::NotFound(message)
        }
        Some("UsernameExistsException" | "AliasExistsException") => {
            ProviderError::AlreadyExists(message)
        }
        Some(
            "TooManyRequestsException"
            | "LimitExceededException"
            | "TooManyFailedAttemptsException",
        ) => ProviderError::ResourceExhausted(message),
        _ => ProviderError::Unknown(message),
    }
}

fn classify<E, R>(operation: &str, err: SdkError<E, R>) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    if let SdkError::TimeoutError(_) = err {
        return ProviderError::Timeout;
    }
    let Some(service_error) = err.as_service_error() else {
        // Dispatch, construction and response failures carry no service code.
        return ProviderError::Unknown(format!(
            "{} failed: {}",
            operation,
            DisplayErrorContext(&err)
        ));
    };
    let message = service_error
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} failed", operation));
    classify_code(service_error.code(), message)
}

fn attribute(name: &str, value: &str) -> Result<AttributeType, ProviderError> {
    AttributeType::builder()
        .name(name)
        .value(value)
        .build()
        .map_err(|e| ProviderError::InvalidArgument(e.to_string()))
}

/// Cognito-backed [`AdminAuthProvider`].
#[derive(Clone)]
pub struct CognitoAdminAuth {
    client: Client,
    user_pool_id: String,
    client_id: String,
}

impl CognitoAdminAuth {
    pub fn new(client: Client, user_pool_id: String, client_id: String) -> Self {
        Self {
            client,
            user_pool_id,
            client_id,
        }
    }

    pub fn from_sdk_config(sdk_config: &aws_config::SdkConfig, config: &CognitoConfig) -> Self {
        Self::new(
            Client::new(sdk_config),
            config.user_pool_id.clone(),
            config.client_id.clone(),
        )
    }

    /// Scope `fut` to `ctx` and record its outcome.
    async fn call<T, F>(
        &self,
        ctx: &RequestContext,
        operation: &'static str,
        fut: F,
    ) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, ProviderError>> + Send,
    {
        let result = ctx.run(fut).await;
        match &result {
            Ok(_) => record_provider_request(operation, "ok"),
            Err(e) => {
                tracing::warn!(operation, error = %e, "Identity provider call failed");
                record_provider_request(operation, e.label());
            }
        }
        result
    }

    async fn send_sign_up(
        &self,
        username: &str,
        email: &str,
        phone_number: &str,
        password: &str,
    ) -> Result<(), ProviderError> {
        let mut request = self
            .client
            .sign_up()
            .client_id(&self.client_id)
            .username(username)
            .password(password)
            .user_attributes(attribute(EMAIL_ATTRIBUTE, email)?);
        if !phone_number.is_empty() {
            request = request.user_attributes(attribute(PHONE_NUMBER_ATTRIBUTE, phone_number)?);
        }
        request
            .send()
            .await
            .map_err(|e| classify(ops::SIGN_UP, e))?;
        Ok(())
    }

    async fn send_confirm_sign_up(&self, username: &str, code: &str) -> Result<(), ProviderError> {
        self.client
            .confirm_sign_up()
            .client_id(&self.client_id)
            .username(username)
            .confirmation_code(code)
            .send()
            .await
            .map_err(|e| classify(ops::CONFIRM_SIGN_UP, e))?;
        Ok(())
    }

    async fn send_get_user(&self, access_token: &str) -> Result<ProviderUser, ProviderError> {
        let output = self
            .client
            .get_user()
            .access_token(access_token)
            .send()
            .await
            .map_err(|e| classify(ops::GET_USER, e))?;

        let mut user = ProviderUser {
            username: output.username().to_string(),
            ..Default::default()
        };
        for attr in output.user_attributes() {
            let value = attr.value().unwrap_or_default();
            match attr.name() {
                EMAIL_ATTRIBUTE => user.email = value.to_string(),
                PHONE_NUMBER_ATTRIBUTE if !value.is_empty() => {
                    user.phone_number = Some(value.to_string())
                }
                _ => {}
            }
        }
        Ok(user)
    }

    async fn send_initiate_auth(
        &self,
        operation: &'static str,
        flow: AuthFlowType,
        parameters: &[(&str, &str)],
    ) -> Result<AuthResult, ProviderError> {
        let mut request = self
            .client
            .initiate_auth()
            .auth_flow(flow)
            .client_id(&self.client_id);
        for (key, value) in parameters {
            request = request.auth_parameters(*key, *value);
        }
        let output = request
            .send()
            .await
            .map_err(|e| classify(operation, e))?;

        // A challenge (MFA, forced password change) means no session yet.
        let result = output.authentication_result().ok_or_else(|| {
            ProviderError::Unauthenticated(format!(
                "authentication challenge required: {:?}",
                output.challenge_name()
            ))
        })?;

        Ok(AuthResult {
            id_token: result.id_token().unwrap_or_default().to_string(),
            access_token: result.access_token().unwrap_or_default().to_string(),
            refresh_token: result.refresh_token().unwrap_or_default().to_string(),
            expires_in: result.expires_in(),
        })
    }

    async fn send_sign_out(&self, access_token: &str) -> Result<(), ProviderError> {
        self.client
            .global_sign_out()
            .access_token(access_token)
            .send()
            .await
            .map_err(|e| classify(ops::SIGN_OUT, e))?;
        Ok(())
    }

    async fn send_change_email(
        &self,
        access_token: &str,
        new_email: &str,
    ) -> Result<(), ProviderError> {
        self.client
            .update_user_attributes()
            .access_token(access_token)
            .user_attributes(attribute(EMAIL_ATTRIBUTE, new_email)?)
            .send()
            .await
            .map_err(|e| classify(ops::CHANGE_EMAIL, e))?;
        Ok(())
    }

    async fn send_confirm_change_email(
        &self,
        access_token: &str,
        code: &str,
    ) -> Result<String, ProviderError> {
        self.client
            .verify_user_attribute()
            .access_token(access_token)
            .attribute_name(EMAIL_ATTRIBUTE)
            .code(code)
            .send()
            .await
            .map_err(|e| classify(ops::CONFIRM_CHANGE_EMAIL, e))?;

        let user = self.send_get_user(access_token).await?;
        Ok(user.email)
    }

    async fn send_change_password(
        &self,
        access_token: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ProviderError> {
        self.client
            .change_password()
            .access_token(access_token)
            .previous_password(old_password)
            .proposed_password(new_password)
            .send()
            .await
            .map_err(|e| classify(ops::CHANGE_PASSWORD, e))?;
        Ok(())
    }

    async fn send_forgot_password(&self, username: &str) -> Result<(), ProviderError> {
        self.client
            .forgot_password()
            .client_id(&self.client_id)
            .username(username)
            .send()
            .await
            .map_err(|e| classify(ops::FORGOT_PASSWORD, e))?;
        Ok(())
    }

    async fn send_confirm_forgot_password(
        &self,
        username: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), ProviderError> {
        self.client
            .confirm_forgot_password()
            .client_id(&self.client_id)
            .username(username)
            .confirmation_code(code)
            .password(new_password)
            .send()
            .await
            .map_err(|e| classify(ops::CONFIRM_FORGOT_PASSWORD, e))?;
        Ok(())
    }

    async fn send_delete_user(&self, username: &str) -> Result<(), ProviderError> {
        self.client
            .admin_delete_user()
            .user_pool_id(&self.user_pool_id)
            .username(username)
            .send()
            .await
            .map_err(|e| classify(ops::DELETE_USER, e))?;
        Ok(())
    }
}

#[async_trait]
impl AdminAuthProvider for CognitoAdminAuth {
    async fn sign_up(
        &self,
        ctx: &RequestContext,
        username: &str,
        email: &str,
        phone_number: &str,
        password: &str,
    ) -> Result<(), ProviderError> {
        self.call(
            ctx,
            ops::SIGN_UP,
            self.send_sign_up(username, email, phone_number, password),
        )
        .await
    }

    async fn confirm_sign_up(
        &self,
        ctx: &RequestContext,
        username: &str,
        code: &str,
    ) -> Result<(), ProviderError> {
        self.call(ctx, ops::CONFIRM_SIGN_UP, self.send_confirm_sign_up(username, code))
            .await
    }

    async fn get_user(
        &self,
        ctx: &RequestContext,
        access_token: &str,
    ) -> Result<ProviderUser, ProviderError> {
        self.call(ctx, ops::GET_USER, self.send_get_user(access_token))
            .await
    }

    async fn get_username(
        &self,
        ctx: &RequestContext,
        access_token: &str,
    ) -> Result<String, ProviderError> {
        let user = self
            .call(ctx, ops::GET_USERNAME, self.send_get_user(access_token))
            .await?;
        Ok(user.username)
    }

    async fn sign_in(
        &self,
        ctx: &RequestContext,
        key: &str,
        password: &str,
    ) -> Result<AuthResult, ProviderError> {
        let parameters = [("USERNAME", key), ("PASSWORD", password)];
        self.call(
            ctx,
            ops::SIGN_IN,
            self.send_initiate_auth(ops::SIGN_IN, AuthFlowType::UserPasswordAuth, &parameters),
        )
        .await
    }

    async fn sign_out(
        &self,
        ctx: &RequestContext,
        access_token: &str,
    ) -> Result<(), ProviderError> {
        self.call(ctx, ops::SIGN_OUT, self.send_sign_out(access_token))
            .await
    }

    async fn refresh_token(
        &self,
        ctx: &RequestContext,
        refresh_token: &str,
    ) -> Result<AuthResult, ProviderError> {
        let parameters = [("REFRESH_TOKEN", refresh_token)];
        self.call(
            ctx,
            ops::REFRESH_TOKEN,
            self.send_initiate_auth(
                ops::REFRESH_TOKEN,
                AuthFlowType::RefreshTokenAuth,
                &parameters,
            ),
        )
        .await
    }

    async fn change_email(
        &self,
        ctx: &RequestContext,
        access_token: &str,
        _username: &str,
        _old_email: &str,
        new_email: &str,
    ) -> Result<(), ProviderError> {
        self.call(
            ctx,
            ops::CHANGE_EMAIL,
            self.send_change_email(access_token, new_email),
        )
        .await
    }

    async fn confirm_change_email(
        &self,
        ctx: &RequestContext,
        access_token: &str,
        _username: &str,
        code: &str,
    ) -> Result<String, ProviderError> {
        self.call(
            ctx,
            ops::CONFIRM_CHANGE_EMAIL,
            self.send_confirm_change_email(access_token, code),
        )
        .await
    }

    async fn change_password(
        &self,
        ctx: &RequestContext,
        access_token: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ProviderError> {
        self.call(
            ctx,
            ops::CHANGE_PASSWORD,
            self.send_change_password(access_token, old_password, new_password),
        )
        .await
    }

    async fn forgot_password(
        &self,
        ctx: &RequestContext,
        username: &str,
    ) -> Result<(), ProviderError> {
        self.call(ctx, ops::FORGOT_PASSWORD, self.send_forgot_password(username))
            .await
    }

    async fn confirm_forgot_password(
        &self,
        ctx: &RequestContext,
        username: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), ProviderError> {
        self.call(
            ctx,
            ops::CONFIRM_FORGOT_PASSWORD,
            self.send_confirm_forgot_password(username, code, new_password),
        )
        .await
    }

    async fn delete_user(
        &self,
        ctx: &RequestContext,
        username: &str,
    ) -> Result<(), ProviderError> {
        self.call(ctx, ops::DELETE_USER, self.send_delete_user(username))
            .await
    }
}
