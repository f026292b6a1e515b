//! 服务间内部接口处理器
//!
//! 这些端点由 X-API-Key 中间件保护，供兄弟服务调用。

use crate::{
    auth::jwt::TokenKind,
    error::AppError,
    middleware::AppState,
    models::{auth::*, role::Role},
};
use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

/// 访问令牌内省。
/// 无效令牌返回 `valid: false` 而非 401——调用方是已通过 API Key
/// 鉴权的服务，令牌状态本身就是查询结果。
pub async fn introspect_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IntrospectRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = match state.token_codec.parse(TokenKind::Access, &req.token) {
        Ok(claims) => IntrospectResponse {
            valid: true,
            user_id: Some(claims.subject),
            role: Some(claims.role.as_str().to_string()),
            is_superadmin: claims.role == Role::SuperAdmin,
            expires_at: Some(claims.expires_at),
        },
        Err(e) => {
            tracing::debug!(reason = %e, "Introspected token is not valid");
            IntrospectResponse::inactive()
        }
    };

    Ok(Json(response))
}
