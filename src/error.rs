//! 统一错误模型
//! 定义所有错误类型和错误响应格式
//!
//! 客户端依赖响应体中的稳定 `code` 字段进行分支处理，
//! 不要依赖 `error` 文本。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    // ---- 凭证错误（请求头层面） ----
    #[error("Authorization header is missing")]
    MissingAuthHeader,

    #[error("Authorization header is not a Bearer credential")]
    InvalidAuthFormat,

    // ---- 令牌错误（均按 401 处理，细分仅用于诊断） ----
    #[error("Token has expired")]
    TokenExpired,

    #[error("Token signature verification failed")]
    InvalidTokenSignature,

    #[error("Token is malformed or of the wrong kind")]
    InvalidToken,

    #[error("Invalid username or password")]
    InvalidCredentials,

    // ---- 服务间 API Key ----
    #[error("X-API-Key header is missing")]
    MissingApiKey,

    #[error("X-API-Key is not in the configured allow-list")]
    InvalidApiKey,

    // ---- 远程校验（失败即拒绝，绝不降级为本地信任） ----
    #[error("Unable to validate credential with the remote authority: {0}")]
    RemoteValidation(String),

    // ---- 授权错误（统一 403） ----
    #[error("Role does not permit this operation")]
    InsufficientRole,

    #[error("No active membership for the requested tenant")]
    NotTenantMember,

    #[error("Remote authority denied superadmin privileges")]
    NotSuperAdmin,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Account is temporarily locked")]
    AccountLocked,

    // ---- 租户上下文 ----
    #[error("No active tenant is set for this user")]
    NoActiveTenant,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// 获取 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingAuthHeader
            | AppError::InvalidAuthFormat
            | AppError::TokenExpired
            | AppError::InvalidTokenSignature
            | AppError::InvalidToken
            | AppError::InvalidCredentials
            | AppError::MissingApiKey
            | AppError::InvalidApiKey
            | AppError::RemoteValidation(_) => StatusCode::UNAUTHORIZED,

            AppError::InsufficientRole
            | AppError::NotTenantMember
            | AppError::NotSuperAdmin
            | AppError::AccountDisabled
            | AppError::AccountLocked => StatusCode::FORBIDDEN,

            AppError::NoActiveTenant | AppError::BadRequest(_) | AppError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }

            AppError::NotFound(_) => StatusCode::NOT_FOUND,

            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 获取稳定错误码（客户端分支依据）
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) | AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::MissingAuthHeader => "MISSING_AUTH_HEADER",
            AppError::InvalidAuthFormat => "INVALID_AUTH_FORMAT",
            AppError::TokenExpired => "TOKEN_EXPIRED",
            AppError::InvalidTokenSignature => "INVALID_TOKEN_SIGNATURE",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::MissingApiKey => "MISSING_API_KEY",
            AppError::InvalidApiKey => "INVALID_API_KEY",
            AppError::RemoteValidation(_) => "UNABLE_TO_VALIDATE",
            AppError::InsufficientRole => "INSUFFICIENT_ROLE",
            AppError::NotTenantMember => "NOT_TENANT_MEMBER",
            AppError::NotSuperAdmin => "NOT_SUPER_ADMIN",
            AppError::AccountDisabled => "ACCOUNT_DISABLED",
            AppError::AccountLocked => "ACCOUNT_LOCKED",
            AppError::NoActiveTenant => "NO_ACTIVE_TENANT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Validation(_) => "VALIDATION_ERROR",
        }
    }

    /// 获取用户友好的错误消息（不包含敏感信息）
    pub fn user_message(&self) -> String {
        match self {
            AppError::Database(_) => "Database error occurred".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::Config(_) => "Configuration error".to_string(),
            other => other.to_string(),
        }
    }

    // 便捷方法
    pub fn not_found(msg: &str) -> Self {
        AppError::NotFound(msg.to_string())
    }

    pub fn validation(msg: &str) -> Self {
        AppError::Validation(msg.to_string())
    }

    pub fn internal(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}

/// 错误响应 DTO：`{error, code}`
#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = ErrorBody {
            error: self.user_message(),
            code: self.code(),
        };

        // 4xx 属客户端问题，记 warn；5xx 记 error
        if status.is_server_error() {
            tracing::error!(code = body.code, message = %self, "Application error");
        } else {
            tracing::warn!(code = body.code, message = %self, "Request rejected");
        }

        (status, Json(body)).into_response()
    }
}

/// 从 config::ConfigError 转换
impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

/// 从 validator::ValidationErrors 转换
impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}
