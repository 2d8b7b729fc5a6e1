//! Postgres-backed admin store.

use async_trait::async_trait;
use chrono::Utc;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::time::Duration;
use tracing::{info, instrument};

use super::context::RequestContext;
use super::error::StoreError;
use super::metrics::DB_QUERY_DURATION;
use super::store::{AdminStore, TxHook};
use crate::config::DatabaseConfig;
use crate::models::{Admin, AdminField, ProviderType};

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(config), fields(service = "admin-service"))]
    pub async fn new(config: &DatabaseConfig) -> Result<Self, AppError> {
        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(&config.url)
            .await
            .map_err(|e| AppError::Unavailable(format!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Unavailable(format!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // =========================================================================
    // Query helpers
    // =========================================================================

    async fn fetch_one_by(
        &self,
        operation: &str,
        column: &str,
        value: &str,
        fields: &[AdminField],
    ) -> Result<Admin, StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&[operation])
            .start_timer();

        let fields = AdminField::resolve(fields);
        let sql = select_sql(fields, column);
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        timer.observe_duration();

        match row {
            Some(row) => Ok(admin_from_row(&row, fields)?),
            None => Err(StoreError::NotFound),
        }
    }

    async fn insert_with_hook(&self, admin: &Admin, hook: TxHook<'_>) -> Result<(), StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_admin"])
            .start_timer();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO admins (
                id, provider_subject, provider_type, email, phone_number,
                created_at, updated_at, verified_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&admin.id)
        .bind(&admin.provider_subject)
        .bind(admin.provider_type.as_i16())
        .bind(&admin.email)
        .bind(&admin.phone_number)
        .bind(admin.created_at)
        .bind(admin.updated_at)
        .bind(admin.verified_at)
        .execute(&mut *tx)
        .await?;

        if let Err(err) = hook.await {
            tx.rollback().await?;
            return Err(StoreError::Hook(err));
        }

        tx.commit().await?;
        timer.observe_duration();
        Ok(())
    }

    async fn soft_delete_with_hook(
        &self,
        admin_id: &str,
        hook: TxHook<'_>,
    ) -> Result<(), StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_admin"])
            .start_timer();

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE admins
            SET deleted_at = $2, updated_at = $2
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(admin_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if let Err(err) = hook.await {
            tx.rollback().await?;
            return Err(StoreError::Hook(err));
        }

        tx.commit().await?;
        timer.observe_duration();
        Ok(())
    }

    async fn set_email(&self, admin_id: &str, email: &str) -> Result<(), StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_email"])
            .start_timer();

        sqlx::query(
            r#"
            UPDATE admins
            SET email = $2, updated_at = $3
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(admin_id)
        .bind(email)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        timer.observe_duration();
        Ok(())
    }

    async fn set_verified_at(&self, admin_id: &str) -> Result<(), StoreError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_verified_at"])
            .start_timer();

        sqlx::query(
            r#"
            UPDATE admins
            SET verified_at = COALESCE(verified_at, $2), updated_at = $2
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(admin_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        timer.observe_duration();
        Ok(())
    }
}

fn select_sql(fields: &[AdminField], column: &str) -> String {
    let columns = fields
        .iter()
        .map(|f| f.column())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT {} FROM admins WHERE {} = $1 AND deleted_at IS NULL LIMIT 1",
        columns, column
    )
}

fn admin_from_row(row: &PgRow, fields: &[AdminField]) -> Result<Admin, sqlx::Error> {
    let mut admin = Admin::default();
    for field in fields {
        match field {
            AdminField::Id => admin.id = row.try_get("id")?,
            AdminField::ProviderSubject => {
                admin.provider_subject = row.try_get("provider_subject")?
            }
            AdminField::ProviderType => {
                admin.provider_type = ProviderType::from_i16(row.try_get("provider_type")?)
            }
            AdminField::Email => admin.email = row.try_get("email")?,
            AdminField::PhoneNumber => admin.phone_number = row.try_get("phone_number")?,
            AdminField::CreatedAt => admin.created_at = row.try_get("created_at")?,
            AdminField::UpdatedAt => admin.updated_at = row.try_get("updated_at")?,
            AdminField::VerifiedAt => admin.verified_at = row.try_get("verified_at")?,
        }
    }
    Ok(admin)
}

#[async_trait]
impl AdminStore for Database {
    #[instrument(skip(self, ctx))]
    async fn get(
        &self,
        ctx: &RequestContext,
        admin_id: &str,
        fields: &[AdminField],
    ) -> Result<Admin, StoreError> {
        ctx.run(self.fetch_one_by("get_admin", "id", admin_id, fields))
            .await
    }

    #[instrument(skip(self, ctx))]
    async fn get_by_provider_subject(
        &self,
        ctx: &RequestContext,
        subject: &str,
        fields: &[AdminField],
    ) -> Result<Admin, StoreError> {
        ctx.run(self.fetch_one_by(
            "get_admin_by_provider_subject",
            "provider_subject",
            subject,
            fields,
        ))
        .await
    }

    #[instrument(skip(self, ctx, email))]
    async fn get_by_email(
        &self,
        ctx: &RequestContext,
        email: &str,
        fields: &[AdminField],
    ) -> Result<Admin, StoreError> {
        ctx.run(self.fetch_one_by("get_admin_by_email", "email", email, fields))
            .await
    }

    #[instrument(skip(self, ctx, admin, hook), fields(admin_id = %admin.id))]
    async fn create(
        &self,
        ctx: &RequestContext,
        admin: &Admin,
        hook: TxHook<'_>,
    ) -> Result<(), StoreError> {
        ctx.run(self.insert_with_hook(admin, hook)).await
    }

    #[instrument(skip(self, ctx, email))]
    async fn update_email(
        &self,
        ctx: &RequestContext,
        admin_id: &str,
        email: &str,
    ) -> Result<(), StoreError> {
        ctx.run(self.set_email(admin_id, email)).await
    }

    #[instrument(skip(self, ctx))]
    async fn update_verified_at(
        &self,
        ctx: &RequestContext,
        admin_id: &str,
    ) -> Result<(), StoreError> {
        ctx.run(self.set_verified_at(admin_id)).await
    }

    #[instrument(skip(self, ctx, hook))]
    async fn delete(
        &self,
        ctx: &RequestContext,
        admin_id: &str,
        hook: TxHook<'_>,
    ) -> Result<(), StoreError> {
        ctx.run(self.soft_delete_with_hook(admin_id, hook)).await
    }
}
