//! 认证与授权中间件
//!
//! 每个请求按固定顺序通过：Bearer 提取 → 访问令牌验证 → 角色门 →
//! 租户范围门（可选）→ 超级管理员远程校验（可选）。任一环节失败即
//! 终止请求，不存在可跳过的环节。

use crate::{
    auth::jwt::TokenKind,
    error::AppError,
    middleware::AppState,
    models::role::Role,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

/// 显式指定目标租户的请求头（超级管理员逐调用指定；成员也可使用，
/// 但仍受成员关系校验约束）
pub const TENANT_HEADER: &str = "x-tenant-id";

/// 认证上下文（附加到请求扩展，请求结束即丢弃，绝不跨请求共享）
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: Role,
    pub is_superadmin: bool,
}

// 实现 FromRequestParts 以便在 handler 中直接提取 AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AppError::MissingAuthHeader)
    }
}

/// 本次请求解析出的租户范围（由 tenant_scope_middleware 填充）
#[derive(Debug, Clone, Copy)]
pub struct TenantScope {
    pub tenant_id: Uuid,
}

impl<S> FromRequestParts<S> for TenantScope
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantScope>()
            .copied()
            .ok_or(AppError::NoActiveTenant)
    }
}

/// 从 Authorization 头提取 Bearer 令牌。
/// 头缺失与格式错误分别报告，便于客户端区分。
pub fn extract_bearer(headers: &HeaderMap) -> Result<String, AppError> {
    let value = headers
        .get("authorization")
        .ok_or(AppError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AppError::InvalidAuthFormat)?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(AppError::InvalidAuthFormat),
    }
}

/// 访问令牌认证中间件 - 必须认证
pub async fn access_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 从 Authorization 头提取令牌
    let token = extract_bearer(req.headers())?;

    // 验证访问令牌，产出类型化声明
    let claims = state.token_codec.parse(TokenKind::Access, &token)?;

    let auth_context = AuthContext {
        user_id: claims.subject,
        role: claims.role,
        is_superadmin: claims.role == Role::SuperAdmin,
    };

    // 附加到请求扩展
    req.extensions_mut().insert(auth_context.clone());

    let mut response = next.run(req).await;

    // 镜像到响应扩展，供最外层审计中间件取用执行者身份
    response.extensions_mut().insert(auth_context);

    Ok(response)
}

/// 角色门中间件。处理器组通过 from_fn_with_state 声明允许的角色
/// 列表；声明大小写不敏感的匹配在令牌解析阶段完成（闭合枚举）。
///
/// 角色门必定位于访问令牌验证之后；上下文缺失属装配缺陷而非
/// 客户端错误，按 500 处理。
pub async fn role_gate_middleware(
    State(allowed): State<&'static [Role]>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let context = req
        .extensions()
        .get::<AuthContext>()
        .ok_or_else(|| AppError::internal("auth context missing before role gate"))?;

    if !allowed.contains(&context.role) {
        tracing::warn!(
            user_id = %context.user_id,
            role = %context.role,
            "Role gate rejected request"
        );
        return Err(AppError::InsufficientRole);
    }

    Ok(next.run(req).await)
}

/// 租户范围中间件。
/// 显式 X-Tenant-Id 头优先；否则回落到用户的当前活动租户；
/// 两者皆无则拒绝。非超级管理员在此处强制成员关系校验。
pub async fn tenant_scope_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let context = req
        .extensions()
        .get::<AuthContext>()
        .cloned()
        .ok_or_else(|| AppError::internal("auth context missing before tenant scope gate"))?;

    let explicit = match req.headers().get(TENANT_HEADER) {
        Some(value) => {
            let raw = value.to_str().map_err(|_| {
                AppError::BadRequest("X-Tenant-Id header is not valid UTF-8".to_string())
            })?;
            Some(Uuid::parse_str(raw).map_err(|_| {
                AppError::BadRequest("X-Tenant-Id header is not a valid UUID".to_string())
            })?)
        }
        None => None,
    };

    let tenant_id = state.tenant_service.resolve_scope(&context, explicit).await?;

    req.extensions_mut().insert(TenantScope { tenant_id });

    Ok(next.run(req).await)
}

/// 超级管理员远程校验中间件。
/// 将原始 Bearer 令牌提交给外部信任机构；远程裁决是最终依据——
/// 本地声明为 SUPERADMIN 而远程否决时仍然拒绝。超时即拒绝
/// （fail-closed）。
pub async fn superadmin_validation_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer(req.headers())?;

    let timeout = std::time::Duration::from_secs(state.config.remote_validator.timeout_secs);
    let verdict = tokio::time::timeout(timeout, state.superadmin_validator.validate_token(&token))
        .await
        .map_err(|_| {
            tracing::warn!("Superadmin validator timed out; rejecting request");
            AppError::RemoteValidation("validator timed out".to_string())
        })??;

    if !verdict.valid {
        tracing::warn!("Remote authority reports token invalid");
        return Err(AppError::InvalidToken);
    }

    if !verdict.is_superadmin {
        tracing::warn!(
            user_id = ?verdict.user_id,
            user_role = ?verdict.user_role,
            "Remote authority denied superadmin"
        );
        return Err(AppError::NotSuperAdmin);
    }

    Ok(next.run(req).await)
}
