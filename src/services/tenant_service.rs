//! 租户上下文解析服务
//!
//! 为租户范围内的操作确定并校验目标租户。所有成员关系数据
//! 经由 MembershipStore 读取，本服务不直接访问存储。

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    models::{role::Role, tenant::Tenant},
    repository::membership_repo::MembershipStore,
};
use std::sync::Arc;
use uuid::Uuid;

pub struct TenantService {
    store: Arc<dyn MembershipStore>,
}

impl TenantService {
    pub fn new(store: Arc<dyn MembershipStore>) -> Self {
        Self { store }
    }

    /// 用户可否访问租户：SUPERADMIN 恒真（隐式属于所有租户），
    /// 否则要求存在 is_active 的成员行。被停用的成员关系与
    /// 不存在的成员关系对调用方不可区分。
    pub async fn validate_access(
        &self,
        user_id: Uuid,
        role: Role,
        tenant_id: Uuid,
    ) -> Result<bool, AppError> {
        if role == Role::SuperAdmin {
            return Ok(true);
        }

        self.store.is_active_member(user_id, tenant_id).await
    }

    /// 校验访问权限，无权限即返回错误
    pub async fn require_access(
        &self,
        user_id: Uuid,
        role: Role,
        tenant_id: Uuid,
    ) -> Result<(), AppError> {
        if !self.validate_access(user_id, role, tenant_id).await? {
            tracing::warn!(
                user_id = %user_id,
                tenant_id = %tenant_id,
                "Tenant access denied"
            );
            return Err(AppError::NotTenantMember);
        }

        Ok(())
    }

    /// 切换用户的活动租户。
    /// SUPERADMIN 可指向任何存在的租户（无需成员关系）；
    /// 其他角色要求活动成员关系。并发切换为 last-writer-wins。
    pub async fn set_active_tenant(
        &self,
        user_id: Uuid,
        role: Role,
        tenant_id: Uuid,
    ) -> Result<(), AppError> {
        if role == Role::SuperAdmin {
            if self.store.find_tenant(tenant_id).await?.is_none() {
                return Err(AppError::not_found("tenant"));
            }
        } else if !self.store.is_active_member(user_id, tenant_id).await? {
            return Err(AppError::NotTenantMember);
        }

        self.store.set_active_tenant(user_id, tenant_id).await
    }

    /// 当前活动租户
    pub async fn get_active_tenant(&self, user_id: Uuid) -> Result<Option<Uuid>, AppError> {
        self.store.get_active_tenant(user_id).await
    }

    /// 用户的活动成员租户列表
    pub async fn list_tenants(&self, user_id: Uuid) -> Result<Vec<Tenant>, AppError> {
        self.store.list_active_tenants(user_id).await
    }

    /// 解析本次请求的租户范围。
    /// 显式指定（X-Tenant-Id）优先；否则回落到活动租户；两者皆无
    /// 则报 NoActiveTenant。无论来源如何，非超级管理员都要通过
    /// 成员关系校验——活动租户的成员关系可能在设置后被停用。
    pub async fn resolve_scope(
        &self,
        context: &AuthContext,
        explicit: Option<Uuid>,
    ) -> Result<Uuid, AppError> {
        let tenant_id = match explicit {
            Some(id) => id,
            None => self
                .store
                .get_active_tenant(context.user_id)
                .await?
                .ok_or(AppError::NoActiveTenant)?,
        };

        self.require_access(context.user_id, context.role, tenant_id).await?;

        Ok(tenant_id)
    }

    /// 租户详情
    pub async fn find_tenant(&self, tenant_id: Uuid) -> Result<Option<Tenant>, AppError> {
        self.store.find_tenant(tenant_id).await
    }

    /// 全部租户（超级管理员界面）
    pub async fn list_all_tenants(&self) -> Result<Vec<Tenant>, AppError> {
        self.store.list_all_tenants().await
    }

    /// 授予成员关系（已存在则重新激活）
    pub async fn grant_membership(&self, user_id: Uuid, tenant_id: Uuid) -> Result<(), AppError> {
        if self.store.find_tenant(tenant_id).await?.is_none() {
            return Err(AppError::not_found("tenant"));
        }

        self.store.grant_membership(user_id, tenant_id).await
    }

    /// 停用成员关系
    pub async fn deactivate_membership(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<(), AppError> {
        if !self.store.deactivate_membership(user_id, tenant_id).await? {
            return Err(AppError::not_found("membership"));
        }

        Ok(())
    }
}
