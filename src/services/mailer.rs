//! 邮件投递接口
//!
//! SMTP 投递由外部协作方实现；本服务只依赖这个窄接口。
//! 默认实现仅记录日志，供本地开发和测试使用。

use crate::error::AppError;
use async_trait::async_trait;

#[async_trait]
pub trait Mailer: Send + Sync {
    /// 发送邮箱验证链接
    async fn send_email_verification(&self, to: &str, token: &str) -> Result<(), AppError>;

    /// 发送密码重置链接
    async fn send_password_reset(&self, to: &str, token: &str) -> Result<(), AppError>;
}

/// 日志型邮件投递（开发/测试环境）
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_email_verification(&self, to: &str, _token: &str) -> Result<(), AppError> {
        tracing::info!(to = %to, "Would send email verification message");
        Ok(())
    }

    async fn send_password_reset(&self, to: &str, _token: &str) -> Result<(), AppError> {
        tracing::info!(to = %to, "Would send password reset message");
        Ok(())
    }
}
