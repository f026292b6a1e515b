//! 超级管理员远程校验客户端
//!
//! 本地签名的角色声明可能过期或被中间服务伪造，最敏感的操作
//! 以独立信任机构的裁决为准。校验失败或超时一律拒绝请求，
//! 绝不降级为仅本地信任。

use crate::{config::RemoteValidatorConfig, error::AppError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// 远程校验裁决。整体以 `valid` 与 `is_superadmin` 为准。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteVerdict {
    pub user_id: Option<Uuid>,
    pub user_role: Option<String>,
    pub is_superadmin: bool,
    pub valid: bool,
}

/// 超级管理员校验器接口
#[async_trait]
pub trait SuperAdminValidator: Send + Sync {
    /// 将原始 Bearer 令牌提交给远程信任机构校验
    async fn validate_token(&self, bearer_token: &str) -> Result<RemoteVerdict, AppError>;
}

#[derive(Serialize)]
struct ValidateRequest<'a> {
    token: &'a str,
}

/// 基于 HTTP 的远程校验器
pub struct HttpSuperAdminValidator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSuperAdminValidator {
    pub fn from_config(config: &RemoteValidatorConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build validator client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl SuperAdminValidator for HttpSuperAdminValidator {
    async fn validate_token(&self, bearer_token: &str) -> Result<RemoteVerdict, AppError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ValidateRequest { token: bearer_token })
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Superadmin validator request failed");
                AppError::RemoteValidation(e.to_string())
            })?;

        if !response.status().is_success() {
            tracing::warn!(
                status = response.status().as_u16(),
                "Superadmin validator returned non-success status"
            );
            return Err(AppError::RemoteValidation(format!(
                "validator returned HTTP {}",
                response.status().as_u16()
            )));
        }

        response.json::<RemoteVerdict>().await.map_err(|e| {
            tracing::warn!(error = %e, "Superadmin validator returned malformed body");
            AppError::RemoteValidation(e.to_string())
        })
    }
}
