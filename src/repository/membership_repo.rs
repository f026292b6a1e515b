//! Tenant membership store (租户成员关系数据访问)
//!
//! The authorization core talks to persisted user<->tenant relations
//! through this trait only — semantic calls, no raw queries elsewhere.

use crate::{error::AppError, models::tenant::Tenant};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Semantic interface over persisted memberships. Queried, never owned,
/// by the authorization layer.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// True iff an `is_active = true` membership row exists.
    /// Deactivated rows answer exactly like absent rows.
    async fn is_active_member(&self, user_id: Uuid, tenant_id: Uuid) -> Result<bool, AppError>;

    /// Tenants the user holds an active membership in
    async fn list_active_tenants(&self, user_id: Uuid) -> Result<Vec<Tenant>, AppError>;

    /// The user's current active tenant, if any
    async fn get_active_tenant(&self, user_id: Uuid) -> Result<Option<Uuid>, AppError>;

    /// Point the user at a tenant. Single-row atomic update;
    /// concurrent switches race last-writer-wins by design.
    async fn set_active_tenant(&self, user_id: Uuid, tenant_id: Uuid) -> Result<(), AppError>;

    /// Look up a tenant row
    async fn find_tenant(&self, tenant_id: Uuid) -> Result<Option<Tenant>, AppError>;

    /// All tenants (superadmin administration surface)
    async fn list_all_tenants(&self) -> Result<Vec<Tenant>, AppError>;

    /// Create or re-activate a membership row
    async fn grant_membership(&self, user_id: Uuid, tenant_id: Uuid) -> Result<(), AppError>;

    /// Deactivate a membership row; returns false when no active row existed
    async fn deactivate_membership(&self, user_id: Uuid, tenant_id: Uuid)
        -> Result<bool, AppError>;
}

/// PostgreSQL-backed membership store
pub struct PgMembershipStore {
    db: PgPool,
}

impl PgMembershipStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MembershipStore for PgMembershipStore {
    async fn is_active_member(&self, user_id: Uuid, tenant_id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM tenant_memberships
                WHERE user_id = $1 AND tenant_id = $2 AND is_active
            )
            "#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .fetch_one(&self.db)
        .await?;

        Ok(exists)
    }

    async fn list_active_tenants(&self, user_id: Uuid) -> Result<Vec<Tenant>, AppError> {
        let tenants = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT t.*
            FROM tenants t
            JOIN tenant_memberships m ON m.tenant_id = t.id
            WHERE m.user_id = $1 AND m.is_active
            ORDER BY t.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(tenants)
    }

    async fn get_active_tenant(&self, user_id: Uuid) -> Result<Option<Uuid>, AppError> {
        let tenant_id: Option<Option<Uuid>> =
            sqlx::query_scalar("SELECT active_tenant_id FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.db)
                .await?;

        Ok(tenant_id.flatten())
    }

    async fn set_active_tenant(&self, user_id: Uuid, tenant_id: Uuid) -> Result<(), AppError> {
        // 单行原子更新；并发切换为 last-writer-wins
        sqlx::query("UPDATE users SET active_tenant_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(tenant_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn find_tenant(&self, tenant_id: Uuid) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
            .bind(tenant_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(tenant)
    }

    async fn list_all_tenants(&self) -> Result<Vec<Tenant>, AppError> {
        let tenants = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants ORDER BY name")
            .fetch_all(&self.db)
            .await?;

        Ok(tenants)
    }

    async fn grant_membership(&self, user_id: Uuid, tenant_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO tenant_memberships (user_id, tenant_id, is_active)
            VALUES ($1, $2, TRUE)
            ON CONFLICT (user_id, tenant_id)
            DO UPDATE SET is_active = TRUE, updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn deactivate_membership(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE tenant_memberships
            SET is_active = FALSE, updated_at = NOW()
            WHERE user_id = $1 AND tenant_id = $2 AND is_active
            "#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
