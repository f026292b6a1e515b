//! 认证相关的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext, error::AppError, middleware::AppState, models::auth::*,
};
use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

/// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let client_ip = crate::middleware::get_client_ip(&headers, state.config.security.trust_proxy)
        .unwrap_or_else(|| "unknown".to_string());
    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let response = state
        .auth_service
        .login(req, &client_ip, user_agent.as_deref())
        .await?;

    Ok(Json(response))
}

/// 刷新令牌
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token_pair = state.auth_service.refresh_token(req).await?;

    Ok(Json(token_pair))
}

/// 请求邮箱验证邮件
pub async fn request_email_verification(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RequestEmailVerification>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    state.auth_service.request_email_verification(&req.email).await?;

    // 不泄露地址是否存在
    Ok(Json(json!({"message": "If the address exists, a verification mail has been sent"})))
}

/// 确认邮箱验证令牌
pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyEmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.verify_email(&req.token).await?;

    Ok(Json(json!({"message": "Email address verified"})))
}

/// 发起密码重置
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    state.auth_service.forgot_password(&req.email).await?;

    // 不泄露地址是否存在
    Ok(Json(json!({"message": "If the address exists, a reset mail has been sent"})))
}

/// 完成密码重置
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    state.auth_service.reset_password(&req.token, &req.new_password).await?;

    Ok(Json(json!({"message": "Password updated"})))
}

/// 获取当前用户信息
pub async fn get_current_user(auth_context: AuthContext) -> Result<impl IntoResponse, AppError> {
    Ok(Json(json!({
        "id": auth_context.user_id,
        "role": auth_context.role,
        "is_superadmin": auth_context.is_superadmin,
    })))
}
