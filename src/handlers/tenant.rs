//! 租户上下文相关的 HTTP 处理器

use crate::{
    auth::middleware::{AuthContext, TenantScope},
    error::AppError,
    middleware::AppState,
    models::tenant::*,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// 当前用户的活动成员租户列表
pub async fn list_my_tenants(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let tenants = state.tenant_service.list_tenants(auth_context.user_id).await?;
    let active = state.tenant_service.get_active_tenant(auth_context.user_id).await?;

    Ok(Json(json!({
        "tenants": tenants,
        "active_tenant_id": active,
        "count": tenants.len()
    })))
}

/// 切换活动租户
pub async fn switch_active_tenant(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Json(req): Json<SwitchTenantRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .tenant_service
        .set_active_tenant(auth_context.user_id, auth_context.role, req.tenant_id)
        .await?;

    Ok(Json(json!({
        "message": "Active tenant switched",
        "active_tenant_id": req.tenant_id
    })))
}

/// 本次请求解析出的租户（演示租户范围门的最小端点）
pub async fn current_tenant(
    State(state): State<Arc<AppState>>,
    scope: TenantScope,
) -> Result<impl IntoResponse, AppError> {
    let tenant = state
        .tenant_service
        .find_tenant(scope.tenant_id)
        .await?
        .ok_or_else(|| AppError::not_found("tenant"))?;

    Ok(Json(tenant))
}

// ==================== 超级管理员界面 ====================

/// 全部租户列表
pub async fn list_all_tenants(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let tenants = state.tenant_service.list_all_tenants().await?;

    Ok(Json(json!({
        "tenants": tenants,
        "count": tenants.len()
    })))
}

/// 授予租户成员关系（已停用则重新激活）
pub async fn grant_membership(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<Uuid>,
    Json(req): Json<GrantMembershipRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.tenant_service.grant_membership(req.user_id, tenant_id).await?;

    Ok(Json(json!({
        "message": "Membership granted",
        "tenant_id": tenant_id,
        "user_id": req.user_id
    })))
}

/// 停用租户成员关系
pub async fn deactivate_membership(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    state.tenant_service.deactivate_membership(user_id, tenant_id).await?;

    Ok(Json(json!({
        "message": "Membership deactivated",
        "tenant_id": tenant_id,
        "user_id": user_id
    })))
}
