//! 路由注册
//! 创建所有 API 路由并应用中间件
//!
//! 中间件顺序（请求方向）：请求追踪 → CORS → 体积限制 → 审计捕获
//! → 各路由组的认证/授权链。审计必须在认证链外层，才能包住完整
//! 的请求生命周期。

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};

use crate::{
    auth::middleware::{
        access_auth_middleware, role_gate_middleware, superadmin_validation_middleware,
        tenant_scope_middleware,
    },
    handlers,
    middleware::{api_key_middleware, audit_capture_middleware, request_tracking_middleware, AppState},
    models::role::Role,
};

/// 审计条目可由管理员与超级管理员查看
const ADMIN_ROLES: &[Role] = &[Role::Admin, Role::SuperAdmin];

/// 仅超级管理员
const SUPERADMIN_ONLY: &[Role] = &[Role::SuperAdmin];

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查）
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    // 认证路由（无需令牌）
    let auth_routes = Router::new()
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route("/api/v1/auth/refresh", post(handlers::auth::refresh_token))
        .route(
            "/api/v1/auth/verify-email/request",
            post(handlers::auth::request_email_verification),
        )
        .route("/api/v1/auth/verify-email", post(handlers::auth::verify_email))
        .route("/api/v1/auth/forgot-password", post(handlers::auth::forgot_password))
        .route("/api/v1/auth/reset-password", post(handlers::auth::reset_password));

    // 需要认证的路由
    let authenticated_routes = Router::new()
        .route("/api/v1/auth/me", get(handlers::auth::get_current_user))
        .route("/api/v1/tenants/mine", get(handlers::tenant::list_my_tenants))
        .route("/api/v1/tenants/active", put(handlers::tenant::switch_active_tenant))
        .layer(from_fn_with_state(state.clone(), access_auth_middleware));

    // 租户范围内的路由（认证 → 租户范围门）
    let tenant_scoped_routes = Router::new()
        .route("/api/v1/tenants/current", get(handlers::tenant::current_tenant))
        .layer(from_fn_with_state(state.clone(), tenant_scope_middleware))
        .layer(from_fn_with_state(state.clone(), access_auth_middleware));

    // 审计查询（认证 → 管理员角色门）
    let admin_routes = Router::new()
        .route("/api/v1/audit/entries", get(handlers::audit::list_audit_entries))
        .route("/api/v1/audit/login-events", get(handlers::audit::list_login_events))
        .layer(from_fn_with_state(ADMIN_ROLES, role_gate_middleware))
        .layer(from_fn_with_state(state.clone(), access_auth_middleware));

    // 租户管理（认证 → 超级管理员角色门 → 远程校验）。
    // 本地声明不足以通过：远程信任机构的裁决是最终依据。
    let superadmin_routes = Router::new()
        .route("/api/v1/tenants", get(handlers::tenant::list_all_tenants))
        .route(
            "/api/v1/tenants/{id}/memberships",
            post(handlers::tenant::grant_membership),
        )
        .route(
            "/api/v1/tenants/{id}/memberships/{user_id}",
            delete(handlers::tenant::deactivate_membership),
        )
        .layer(from_fn_with_state(state.clone(), superadmin_validation_middleware))
        .layer(from_fn_with_state(SUPERADMIN_ONLY, role_gate_middleware))
        .layer(from_fn_with_state(state.clone(), access_auth_middleware));

    // 服务间内部接口（X-API-Key 鉴权）
    let internal_routes = Router::new()
        .route("/api/v1/internal/introspect", post(handlers::internal::introspect_token))
        .layer(from_fn_with_state(state.clone(), api_key_middleware));

    // 指标端点
    let metrics_routes = Router::new().route("/metrics", get(handlers::metrics::metrics_export));

    // 组合所有路由
    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(authenticated_routes)
        .merge(tenant_scoped_routes)
        .merge(admin_routes)
        .merge(superadmin_routes)
        .merge(internal_routes)
        .merge(metrics_routes)
        .layer(from_fn_with_state(state.clone(), audit_capture_middleware))
        .layer(RequestBodyLimitLayer::new(state.config.audit.max_body_bytes * 2))
        .layer(CorsLayer::permissive())
        .layer(from_fn(request_tracking_middleware))
        .with_state(state)
}
