//! Admin identity lifecycle.
//!
//! Every operation is an ordered sequence of store and provider calls. Writes
//! that touch both systems (create, delete) hand the provider call to the
//! store so it runs inside the store's transaction; a provider failure undoes
//! the local write. Nothing here retries or logs.

use chrono::{DateTime, Utc};
use futures::future::{self, FutureExt};
use service_core::error::AppError;
use std::sync::Arc;
use uuid::Uuid;

use super::context::RequestContext;
use super::error::StoreError;
use super::provider::AdminAuthProvider;
use super::store::{AdminStore, TxHook};
use crate::models::{Admin, AdminAuth, AdminField, NewAdmin, ProviderType};

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;
pub type IdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Fresh opaque identifier: a v4 UUID without hyphens.
pub fn new_opaque_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn check_confirmation(password: &str, confirmation: &str) -> Result<(), AppError> {
    if password != confirmation {
        return Err(AppError::InvalidArgument(
            "password and password confirmation do not match".to_string(),
        ));
    }
    Ok(())
}

fn no_hook<'a>() -> TxHook<'a> {
    future::ready(Ok(())).boxed()
}

#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn AdminStore>,
    provider: Arc<dyn AdminAuthProvider>,
    now: Clock,
    new_id: IdGenerator,
}

impl AdminService {
    pub fn new(store: Arc<dyn AdminStore>, provider: Arc<dyn AdminAuthProvider>) -> Self {
        Self {
            store,
            provider,
            now: Arc::new(Utc::now),
            new_id: Arc::new(new_opaque_id),
        }
    }

    pub fn with_clock(mut self, now: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.now = Arc::new(now);
        self
    }

    pub fn with_id_generator(
        mut self,
        new_id: impl Fn() -> String + Send + Sync + 'static,
    ) -> Self {
        self.new_id = Arc::new(new_id);
        self
    }

    /// Register an email admin and return its ID.
    ///
    /// Signing up again with an email that is already registered returns the
    /// existing ID without contacting the provider.
    pub async fn sign_up(
        &self,
        ctx: &RequestContext,
        email: &str,
        phone_number: &str,
        password: &str,
        password_confirmation: &str,
    ) -> Result<String, AppError> {
        check_confirmation(password, password_confirmation)?;

        let admin = Admin::new(
            NewAdmin {
                id: (self.new_id)(),
                provider_subject: (self.new_id)(),
                provider_type: ProviderType::Email,
                email: email.to_string(),
                phone_number: Some(phone_number.to_string()),
            },
            (self.now)(),
        );
        let phone = admin.international_phone_number().unwrap_or_default();

        let hook = self.provider.sign_up(
            ctx,
            &admin.provider_subject,
            &admin.email,
            &phone,
            password,
        );
        let created = self.store.create(ctx, &admin, hook).await;

        match created {
            Ok(()) => Ok(admin.id),
            Err(StoreError::AlreadyExists) => {
                let existing = self
                    .store
                    .get_by_email(ctx, email, &[AdminField::Id])
                    .await?;
                Ok(existing.id)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Register an admin already authenticated by the provider out of band.
    /// The record is verified on creation.
    pub async fn sign_up_with_oauth(
        &self,
        ctx: &RequestContext,
        access_token: &str,
    ) -> Result<Admin, AppError> {
        let user = self.provider.get_user(ctx, access_token).await?;

        let admin = Admin::new(
            NewAdmin {
                id: (self.new_id)(),
                provider_subject: user.username,
                provider_type: ProviderType::OAuth,
                email: user.email,
                phone_number: user.phone_number,
            },
            (self.now)(),
        );

        let created = self.store.create(ctx, &admin, no_hook()).await;
        let admin_id = match created {
            Ok(()) => admin.id,
            Err(StoreError::AlreadyExists) => {
                match self
                    .store
                    .get_by_provider_subject(ctx, &admin.provider_subject, &[AdminField::Id])
                    .await
                {
                    Ok(existing) => existing.id,
                    // The email belongs to a different identity.
                    Err(StoreError::NotFound) => {
                        return Err(AppError::AlreadyExists(format!(
                            "email {} is already registered",
                            admin.email
                        )))
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Err(e) => return Err(e.into()),
        };

        self.store.update_verified_at(ctx, &admin_id).await?;
        Ok(self.store.get(ctx, &admin_id, &[]).await?)
    }

    /// Confirm an email sign-up with the code the provider sent.
    pub async fn verify(
        &self,
        ctx: &RequestContext,
        admin_id: &str,
        verify_code: &str,
    ) -> Result<(), AppError> {
        let admin = self
            .store
            .get(
                ctx,
                admin_id,
                &[AdminField::ProviderSubject, AdminField::VerifiedAt],
            )
            .await?;
        if admin.is_verified() {
            return Err(AppError::FailedPrecondition(
                "admin is already verified".to_string(),
            ));
        }

        self.provider
            .confirm_sign_up(ctx, &admin.provider_subject, verify_code)
            .await?;
        self.store.update_verified_at(ctx, admin_id).await?;
        Ok(())
    }

    pub async fn sign_in(
        &self,
        ctx: &RequestContext,
        key: &str,
        password: &str,
    ) -> Result<AdminAuth, AppError> {
        let session = self.provider.sign_in(ctx, key, password).await?;
        let admin = self
            .resolve(ctx, &session.access_token, &[AdminField::Id])
            .await?;
        Ok(AdminAuth::new(&admin, session))
    }

    /// Bind a provider-issued OAuth access token to the local admin.
    pub async fn sign_in_with_oauth(
        &self,
        ctx: &RequestContext,
        access_token: &str,
    ) -> Result<AdminAuth, AppError> {
        let admin = self.resolve(ctx, access_token, &[AdminField::Id]).await?;
        Ok(AdminAuth {
            admin_id: admin.id,
            access_token: access_token.to_string(),
            refresh_token: String::new(),
            expires_in: 0,
        })
    }

    pub async fn refresh_token(
        &self,
        ctx: &RequestContext,
        refresh_token: &str,
    ) -> Result<AdminAuth, AppError> {
        let mut session = self.provider.refresh_token(ctx, refresh_token).await?;
        if session.refresh_token.is_empty() {
            session.refresh_token = refresh_token.to_string();
        }
        let admin = self
            .resolve(ctx, &session.access_token, &[AdminField::Id])
            .await?;
        Ok(AdminAuth::new(&admin, session))
    }

    pub async fn sign_out(&self, ctx: &RequestContext, access_token: &str) -> Result<(), AppError> {
        self.provider.sign_out(ctx, access_token).await?;
        Ok(())
    }

    /// The admin owning `access_token`. Unverified admins are rejected.
    pub async fn get_admin(
        &self,
        ctx: &RequestContext,
        access_token: &str,
    ) -> Result<Admin, AppError> {
        let admin = self.resolve(ctx, access_token, &[]).await?;
        if !admin.is_verified() {
            return Err(AppError::Unauthenticated("not verified".to_string()));
        }
        Ok(admin)
    }

    pub async fn get_admin_by_id(
        &self,
        ctx: &RequestContext,
        admin_id: &str,
    ) -> Result<Admin, AppError> {
        Ok(self.store.get(ctx, admin_id, &[]).await?)
    }

    /// Start an email change. The local email is untouched until the change
    /// is confirmed.
    pub async fn change_email(
        &self,
        ctx: &RequestContext,
        access_token: &str,
        new_email: &str,
    ) -> Result<(), AppError> {
        let admin = self
            .resolve(
                ctx,
                access_token,
                &[
                    AdminField::ProviderSubject,
                    AdminField::ProviderType,
                    AdminField::Email,
                ],
            )
            .await?;
        if admin.provider_type != ProviderType::Email {
            return Err(AppError::FailedPrecondition(
                "email can only be changed for email sign-ups".to_string(),
            ));
        }

        self.provider
            .change_email(
                ctx,
                access_token,
                &admin.provider_subject,
                &admin.email,
                new_email,
            )
            .await?;
        Ok(())
    }

    /// Confirm a pending email change, then record the confirmed address.
    pub async fn confirm_email_change(
        &self,
        ctx: &RequestContext,
        access_token: &str,
        verify_code: &str,
    ) -> Result<(), AppError> {
        let admin = self
            .resolve(
                ctx,
                access_token,
                &[AdminField::Id, AdminField::ProviderSubject],
            )
            .await?;

        let email = self
            .provider
            .confirm_change_email(ctx, access_token, &admin.provider_subject, verify_code)
            .await?;
        self.store.update_email(ctx, &admin.id, &email).await?;
        Ok(())
    }

    pub async fn change_password(
        &self,
        ctx: &RequestContext,
        access_token: &str,
        old_password: &str,
        new_password: &str,
        password_confirmation: &str,
    ) -> Result<(), AppError> {
        check_confirmation(new_password, password_confirmation)?;
        self.provider
            .change_password(ctx, access_token, old_password, new_password)
            .await?;
        Ok(())
    }

    pub async fn forgot_password(&self, ctx: &RequestContext, email: &str) -> Result<(), AppError> {
        let admin = self
            .store
            .get_by_email(ctx, email, &[AdminField::ProviderSubject])
            .await?;
        self.provider
            .forgot_password(ctx, &admin.provider_subject)
            .await?;
        Ok(())
    }

    pub async fn reset_password(
        &self,
        ctx: &RequestContext,
        email: &str,
        verify_code: &str,
        new_password: &str,
        password_confirmation: &str,
    ) -> Result<(), AppError> {
        check_confirmation(new_password, password_confirmation)?;
        let admin = self
            .store
            .get_by_email(ctx, email, &[AdminField::ProviderSubject])
            .await?;
        self.provider
            .confirm_forgot_password(ctx, &admin.provider_subject, verify_code, new_password)
            .await?;
        Ok(())
    }

    /// Soft-delete the admin and remove it from the provider. Deleting an
    /// admin that does not exist succeeds.
    pub async fn delete(&self, ctx: &RequestContext, admin_id: &str) -> Result<(), AppError> {
        let admin = match self
            .store
            .get(ctx, admin_id, &[AdminField::ProviderSubject])
            .await
        {
            Ok(admin) => admin,
            Err(StoreError::NotFound) => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let hook = self.provider.delete_user(ctx, &admin.provider_subject);
        self.store.delete(ctx, admin_id, hook).await?;
        Ok(())
    }

    /// Resolve an access token to the local record of its subject.
    async fn resolve(
        &self,
        ctx: &RequestContext,
        access_token: &str,
        fields: &[AdminField],
    ) -> Result<Admin, AppError> {
        let subject = self.provider.get_username(ctx, access_token).await?;
        Ok(self
            .store
            .get_by_provider_subject(ctx, &subject, fields)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::error::ProviderError;
    use crate::services::provider::{ops, MockAdminAuth};
    use crate::services::store::MemoryAdminStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tonic::Code;

    const EMAIL: &str = "a@x.com";
    const PASSWORD: &str = "pw123456";

    struct Fixture {
        service: AdminService,
        store: Arc<MemoryAdminStore>,
        auth: Arc<MockAdminAuth>,
        ctx: RequestContext,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryAdminStore::new());
        let auth = Arc::new(MockAdminAuth::new());
        let counter = AtomicUsize::new(0);
        let service = AdminService::new(store.clone(), auth.clone())
            .with_id_generator(move || format!("id-{}", counter.fetch_add(1, Ordering::SeqCst)));
        Fixture {
            service,
            store,
            auth,
            ctx: RequestContext::background(),
        }
    }

    async fn sign_up(f: &Fixture, email: &str) -> String {
        f.service
            .sign_up(&f.ctx, email, "09012345678", PASSWORD, PASSWORD)
            .await
            .unwrap()
    }

    /// Sign up, verify and sign in; returns the admin ID and its session.
    async fn verified_session(f: &Fixture, email: &str) -> AdminAuth {
        let admin_id = sign_up(f, email).await;
        f.service
            .verify(&f.ctx, &admin_id, MockAdminAuth::VALID_CODE)
            .await
            .unwrap();
        f.service.sign_in(&f.ctx, email, PASSWORD).await.unwrap()
    }

    async fn oauth_session(f: &Fixture, subject: &str, email: &str) -> String {
        f.auth.add_user(subject, email, PASSWORD, true).await;
        f.auth.issue_session(subject).await.access_token
    }

    #[tokio::test]
    async fn test_sign_up_twice_returns_same_id() {
        let f = fixture();
        let first = sign_up(&f, EMAIL).await;
        let second = sign_up(&f, EMAIL).await;

        assert_eq!(first, second);
        let rows = f.store.snapshot().await;
        assert_eq!(rows.iter().filter(|a| a.email == EMAIL).count(), 1);
        assert_eq!(f.auth.calls(ops::SIGN_UP).await, 1);
    }

    #[tokio::test]
    async fn test_sign_up_record_shape() {
        let f = fixture();
        let admin_id = sign_up(&f, EMAIL).await;
        let admin = f.store.get(&f.ctx, &admin_id, &[]).await.unwrap();

        assert_eq!(admin.phone_number.as_deref(), Some("09012345678"));
        assert_eq!(admin.provider_type, ProviderType::Email);
        assert_ne!(admin.id, admin.provider_subject);
        assert!(f.auth.user_exists(&admin.provider_subject).await);
    }

    #[tokio::test]
    async fn test_sign_up_provider_failure_leaves_no_row() {
        let f = fixture();
        f.auth
            .fail_on(
                ops::SIGN_UP,
                ProviderError::ResourceExhausted("throttled".into()),
            )
            .await;

        let err = f
            .service
            .sign_up(&f.ctx, EMAIL, "", PASSWORD, PASSWORD)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::ResourceExhausted);

        let lookup = f.store.get_by_email(&f.ctx, EMAIL, &[]).await.unwrap_err();
        assert!(lookup.is_not_found());

        // A retry after the provider recovers succeeds without cleanup.
        f.auth.clear_failures().await;
        let admin_id = sign_up(&f, EMAIL).await;
        assert!(f.store.get(&f.ctx, &admin_id, &[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_password_mismatch_never_reaches_provider() {
        let f = fixture();

        let err = f
            .service
            .sign_up(&f.ctx, EMAIL, "", PASSWORD, "different1")
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);

        let err = f
            .service
            .change_password(&f.ctx, "token", PASSWORD, "newpass99", "newpass98")
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);

        let err = f
            .service
            .reset_password(&f.ctx, EMAIL, "123456", "newpass99", "newpass98")
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);

        assert_eq!(f.auth.calls(ops::SIGN_UP).await, 0);
        assert_eq!(f.auth.calls(ops::CHANGE_PASSWORD).await, 0);
        assert_eq!(f.auth.calls(ops::CONFIRM_FORGOT_PASSWORD).await, 0);
    }

    #[tokio::test]
    async fn test_verify_sets_verified_at() {
        let f = fixture();
        let admin_id = sign_up(&f, EMAIL).await;

        f.service
            .verify(&f.ctx, &admin_id, MockAdminAuth::VALID_CODE)
            .await
            .unwrap();

        let admin = f.store.get(&f.ctx, &admin_id, &[]).await.unwrap();
        assert!(admin.is_verified());
        assert!(f.auth.is_confirmed(&admin.provider_subject).await);
    }

    #[tokio::test]
    async fn test_verify_twice_is_failed_precondition() {
        let f = fixture();
        let admin_id = sign_up(&f, EMAIL).await;
        f.service
            .verify(&f.ctx, &admin_id, MockAdminAuth::VALID_CODE)
            .await
            .unwrap();

        let err = f
            .service
            .verify(&f.ctx, &admin_id, MockAdminAuth::VALID_CODE)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::FailedPrecondition);
        assert_eq!(f.auth.calls(ops::CONFIRM_SIGN_UP).await, 1);
    }

    #[tokio::test]
    async fn test_verify_with_bad_code_keeps_admin_unverified() {
        let f = fixture();
        let admin_id = sign_up(&f, EMAIL).await;

        let err = f
            .service
            .verify(&f.ctx, &admin_id, "bad-code")
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);

        let admin = f.store.get(&f.ctx, &admin_id, &[]).await.unwrap();
        assert!(admin.verified_at.is_none());
    }

    #[tokio::test]
    async fn test_verify_unknown_admin_is_not_found() {
        let f = fixture();
        let err = f
            .service
            .verify(&f.ctx, "missing", MockAdminAuth::VALID_CODE)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::NotFound);
        assert_eq!(f.auth.calls(ops::CONFIRM_SIGN_UP).await, 0);
    }

    #[tokio::test]
    async fn test_sign_in_resolves_admin_id() {
        let f = fixture();
        let session = verified_session(&f, EMAIL).await;

        let admin = f.store.get_by_email(&f.ctx, EMAIL, &[]).await.unwrap();
        assert_eq!(session.admin_id, admin.id);
        assert!(!session.access_token.is_empty());
        assert_eq!(session.expires_in, MockAdminAuth::EXPIRES_IN);
    }

    #[tokio::test]
    async fn test_sign_in_with_wrong_password_is_unauthenticated() {
        let f = fixture();
        verified_session(&f, EMAIL).await;

        let err = f
            .service
            .sign_in(&f.ctx, EMAIL, "wrong-password")
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::Unauthenticated);
    }

    #[tokio::test]
    async fn test_get_admin_requires_verification() {
        let f = fixture();
        let admin_id = sign_up(&f, EMAIL).await;
        let subject = f
            .store
            .get(&f.ctx, &admin_id, &[])
            .await
            .unwrap()
            .provider_subject;
        // The provider issues a valid token even though the local record
        // is still unverified.
        let token = f.auth.issue_session(&subject).await.access_token;

        let err = f.service.get_admin(&f.ctx, &token).await.unwrap_err();
        assert_eq!(err.code(), Code::Unauthenticated);
        assert_eq!(err.detail(), "not verified");

        f.service
            .verify(&f.ctx, &admin_id, MockAdminAuth::VALID_CODE)
            .await
            .unwrap();
        let admin = f.service.get_admin(&f.ctx, &token).await.unwrap();
        assert_eq!(admin.id, admin_id);
    }

    #[tokio::test]
    async fn test_refresh_keeps_callers_refresh_token() {
        let f = fixture();
        let session = verified_session(&f, EMAIL).await;

        let refreshed = f
            .service
            .refresh_token(&f.ctx, &session.refresh_token)
            .await
            .unwrap();
        assert_eq!(refreshed.admin_id, session.admin_id);
        assert_eq!(refreshed.refresh_token, session.refresh_token);
        assert_ne!(refreshed.access_token, session.access_token);
    }

    #[tokio::test]
    async fn test_sign_out_revokes_session() {
        let f = fixture();
        let session = verified_session(&f, EMAIL).await;

        f.service
            .sign_out(&f.ctx, &session.access_token)
            .await
            .unwrap();
        let err = f
            .service
            .get_admin(&f.ctx, &session.access_token)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::Unauthenticated);
    }

    #[tokio::test]
    async fn test_oauth_sign_up_is_verified_and_idempotent() {
        let f = fixture();
        let token = oauth_session(&f, "google_123", "o@x.com").await;

        let first = f.service.sign_up_with_oauth(&f.ctx, &token).await.unwrap();
        assert_eq!(first.provider_type, ProviderType::OAuth);
        assert_eq!(first.provider_subject, "google_123");
        assert!(first.is_verified());

        let second = f.service.sign_up_with_oauth(&f.ctx, &token).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.verified_at, first.verified_at);
        assert_eq!(f.store.snapshot().await.len(), 1);

        let session = f
            .service
            .sign_in_with_oauth(&f.ctx, &token)
            .await
            .unwrap();
        assert_eq!(session.admin_id, first.id);
        assert_eq!(session.access_token, token);
    }

    #[tokio::test]
    async fn test_oauth_sign_up_with_taken_email_is_already_exists() {
        let f = fixture();
        sign_up(&f, EMAIL).await;
        let token = oauth_session(&f, "google_123", EMAIL).await;

        let err = f
            .service
            .sign_up_with_oauth(&f.ctx, &token)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::AlreadyExists);
    }

    #[tokio::test]
    async fn test_change_email_rejects_oauth_admin() {
        let f = fixture();
        let token = oauth_session(&f, "google_123", "o@x.com").await;
        f.service.sign_up_with_oauth(&f.ctx, &token).await.unwrap();

        let err = f
            .service
            .change_email(&f.ctx, &token, "new@x.com")
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::FailedPrecondition);
        assert_eq!(f.auth.calls(ops::CHANGE_EMAIL).await, 0);
    }

    #[tokio::test]
    async fn test_email_change_updates_local_record_only_on_confirm() {
        let f = fixture();
        let session = verified_session(&f, EMAIL).await;

        f.service
            .change_email(&f.ctx, &session.access_token, "new@x.com")
            .await
            .unwrap();
        let admin = f.store.get(&f.ctx, &session.admin_id, &[]).await.unwrap();
        assert_eq!(admin.email, EMAIL);

        let err = f
            .service
            .confirm_email_change(&f.ctx, &session.access_token, "000000")
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
        let admin = f.store.get(&f.ctx, &session.admin_id, &[]).await.unwrap();
        assert_eq!(admin.email, EMAIL);

        f.service
            .confirm_email_change(&f.ctx, &session.access_token, MockAdminAuth::VALID_CODE)
            .await
            .unwrap();
        let admin = f.store.get(&f.ctx, &session.admin_id, &[]).await.unwrap();
        assert_eq!(admin.email, "new@x.com");
    }

    #[tokio::test]
    async fn test_change_password() {
        let f = fixture();
        let session = verified_session(&f, EMAIL).await;

        f.service
            .change_password(&f.ctx, &session.access_token, PASSWORD, "newpass99", "newpass99")
            .await
            .unwrap();
        assert!(f.service.sign_in(&f.ctx, EMAIL, "newpass99").await.is_ok());
    }

    #[tokio::test]
    async fn test_forgot_and_reset_password() {
        let f = fixture();
        verified_session(&f, EMAIL).await;

        f.service.forgot_password(&f.ctx, EMAIL).await.unwrap();
        f.service
            .reset_password(
                &f.ctx,
                EMAIL,
                MockAdminAuth::VALID_CODE,
                "newpass99",
                "newpass99",
            )
            .await
            .unwrap();

        assert!(f.service.sign_in(&f.ctx, EMAIL, "newpass99").await.is_ok());
        let err = f
            .service
            .sign_in(&f.ctx, EMAIL, PASSWORD)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::Unauthenticated);
    }

    #[tokio::test]
    async fn test_forgot_password_for_unknown_email_is_not_found() {
        let f = fixture();
        let err = f
            .service
            .forgot_password(&f.ctx, "nobody@x.com")
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::NotFound);
        assert_eq!(f.auth.calls(ops::FORGOT_PASSWORD).await, 0);
    }

    #[tokio::test]
    async fn test_delete_missing_admin_succeeds() {
        let f = fixture();
        f.service.delete(&f.ctx, "missing").await.unwrap();
        assert_eq!(f.auth.calls(ops::DELETE_USER).await, 0);
    }

    #[tokio::test]
    async fn test_delete_removes_admin_from_both_systems() {
        let f = fixture();
        let admin_id = sign_up(&f, EMAIL).await;
        let subject = f
            .store
            .get(&f.ctx, &admin_id, &[])
            .await
            .unwrap()
            .provider_subject;

        f.service.delete(&f.ctx, &admin_id).await.unwrap();
        assert!(f
            .store
            .get(&f.ctx, &admin_id, &[])
            .await
            .unwrap_err()
            .is_not_found());
        assert!(!f.auth.user_exists(&subject).await);

        // Deleting again is a no-op.
        f.service.delete(&f.ctx, &admin_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_provider_failure_keeps_record() {
        let f = fixture();
        let admin_id = sign_up(&f, EMAIL).await;
        f.auth
            .fail_on(ops::DELETE_USER, ProviderError::Timeout)
            .await;

        let err = f.service.delete(&f.ctx, &admin_id).await.unwrap_err();
        assert_eq!(err.code(), Code::DeadlineExceeded);
        assert!(f.store.get(&f.ctx, &admin_id, &[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_canceled_context_is_canceled() {
        let f = fixture();
        let ctx = RequestContext::background();
        ctx.cancel();

        let err = f
            .service
            .sign_up(&ctx, EMAIL, "", PASSWORD, PASSWORD)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::Cancelled);
        assert!(f.store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_get_admin_by_id() {
        let f = fixture();
        let admin_id = sign_up(&f, EMAIL).await;
        let admin = f.service.get_admin_by_id(&f.ctx, &admin_id).await.unwrap();
        assert_eq!(admin.email, EMAIL);

        let err = f
            .service
            .get_admin_by_id(&f.ctx, "missing")
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::NotFound);
    }
}
