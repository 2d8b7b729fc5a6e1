//! Identity record store contract and an in-memory implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::context::RequestContext;
use super::error::{ProviderError, StoreError};
use crate::models::{Admin, AdminField};

/// Provider call executed inside the store's transaction. If it fails, the
/// local write it accompanies is rolled back.
pub type TxHook<'a> = BoxFuture<'a, Result<(), ProviderError>>;

/// Durable admin records. Reads never return soft-deleted rows.
#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn get(
        &self,
        ctx: &RequestContext,
        admin_id: &str,
        fields: &[AdminField],
    ) -> Result<Admin, StoreError>;

    async fn get_by_provider_subject(
        &self,
        ctx: &RequestContext,
        subject: &str,
        fields: &[AdminField],
    ) -> Result<Admin, StoreError>;

    async fn get_by_email(
        &self,
        ctx: &RequestContext,
        email: &str,
        fields: &[AdminField],
    ) -> Result<Admin, StoreError>;

    /// Insert `admin`, then run `hook` before committing.
    async fn create(
        &self,
        ctx: &RequestContext,
        admin: &Admin,
        hook: TxHook<'_>,
    ) -> Result<(), StoreError>;

    async fn update_email(
        &self,
        ctx: &RequestContext,
        admin_id: &str,
        email: &str,
    ) -> Result<(), StoreError>;

    /// Mark the admin verified. A record that is already verified keeps its
    /// original timestamp.
    async fn update_verified_at(
        &self,
        ctx: &RequestContext,
        admin_id: &str,
    ) -> Result<(), StoreError>;

    /// Soft-delete the admin, then run `hook` before committing.
    async fn delete(
        &self,
        ctx: &RequestContext,
        admin_id: &str,
        hook: TxHook<'_>,
    ) -> Result<(), StoreError>;
}

/// Store kept in process memory. Holds its lock across the hook, so every
/// write is serialized and a failed hook leaves no trace.
pub struct MemoryAdminStore {
    rows: Mutex<Vec<Admin>>,
    now: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

impl Default for MemoryAdminStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAdminStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            now: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(now: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            now: Arc::new(now),
        }
    }

    /// Every row, including soft-deleted ones.
    pub async fn snapshot(&self) -> Vec<Admin> {
        self.rows.lock().await.clone()
    }

    /// Seed a row directly, bypassing uniqueness checks.
    pub async fn insert(&self, admin: Admin) {
        self.rows.lock().await.push(admin);
    }

    async fn find<P>(
        &self,
        ctx: &RequestContext,
        fields: &[AdminField],
        predicate: P,
    ) -> Result<Admin, StoreError>
    where
        P: Fn(&Admin) -> bool + Send + Sync,
    {
        ctx.run(async {
            let rows = self.rows.lock().await;
            rows.iter()
                .find(|a| a.deleted_at.is_none() && predicate(a))
                .map(|a| a.project(fields))
                .ok_or(StoreError::NotFound)
        })
        .await
    }
}

#[async_trait]
impl AdminStore for MemoryAdminStore {
    async fn get(
        &self,
        ctx: &RequestContext,
        admin_id: &str,
        fields: &[AdminField],
    ) -> Result<Admin, StoreError> {
        self.find(ctx, fields, |a| a.id == admin_id).await
    }

    async fn get_by_provider_subject(
        &self,
        ctx: &RequestContext,
        subject: &str,
        fields: &[AdminField],
    ) -> Result<Admin, StoreError> {
        self.find(ctx, fields, |a| a.provider_subject == subject)
            .await
    }

    async fn get_by_email(
        &self,
        ctx: &RequestContext,
        email: &str,
        fields: &[AdminField],
    ) -> Result<Admin, StoreError> {
        self.find(ctx, fields, |a| a.email == email).await
    }

    async fn create(
        &self,
        ctx: &RequestContext,
        admin: &Admin,
        hook: TxHook<'_>,
    ) -> Result<(), StoreError> {
        ctx.run(async {
            let mut rows = self.rows.lock().await;
            let conflict = rows.iter().any(|a| {
                a.id == admin.id
                    || (a.deleted_at.is_none()
                        && (a.provider_subject == admin.provider_subject
                            || a.email == admin.email))
            });
            if conflict {
                return Err(StoreError::AlreadyExists);
            }

            // Staged until the hook succeeds.
            let staged = admin.clone();
            if let Err(err) = hook.await {
                return Err(StoreError::Hook(err));
            }
            rows.push(staged);
            Ok(())
        })
        .await
    }

    async fn update_email(
        &self,
        ctx: &RequestContext,
        admin_id: &str,
        email: &str,
    ) -> Result<(), StoreError> {
        ctx.run(async {
            let mut rows = self.rows.lock().await;
            let taken = rows
                .iter()
                .any(|a| a.deleted_at.is_none() && a.id != admin_id && a.email == email);
            if taken {
                return Err(StoreError::AlreadyExists);
            }
            let now = (self.now)();
            if let Some(admin) = rows
                .iter_mut()
                .find(|a| a.id == admin_id && a.deleted_at.is_none())
            {
                admin.email = email.to_string();
                admin.updated_at = now;
            }
            Ok(())
        })
        .await
    }

    async fn update_verified_at(
        &self,
        ctx: &RequestContext,
        admin_id: &str,
    ) -> Result<(), StoreError> {
        ctx.run(async {
            let mut rows = self.rows.lock().await;
            let now = (self.now)();
            if let Some(admin) = rows
                .iter_mut()
                .find(|a| a.id == admin_id && a.deleted_at.is_none())
            {
                admin.verified_at.get_or_insert(now);
                admin.updated_at = now;
            }
            Ok(())
        })
        .await
    }

    async fn delete(
        &self,
        ctx: &RequestContext,
        admin_id: &str,
        hook: TxHook<'_>,
    ) -> Result<(), StoreError> {
        ctx.run(async {
            let mut rows = self.rows.lock().await;
            let now = (self.now)();
            let position = rows
                .iter()
                .position(|a| a.id == admin_id && a.deleted_at.is_none());

            if let Err(err) = hook.await {
                return Err(StoreError::Hook(err));
            }

            if let Some(index) = position {
                rows[index].deleted_at = Some(now);
                rows[index].updated_at = now;
            }
            Ok(())
        })
        .await
    }
}
