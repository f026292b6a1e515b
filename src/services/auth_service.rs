//! 认证服务：登录、令牌刷新、邮箱验证、密码重置
//!
//! 令牌全程无状态：有效性只取决于签名与过期时间，签发后不再
//! 变更。刷新即校验 refresh 令牌并签发新令牌对。

use crate::{
    auth::jwt::{TokenCodec, TokenKind},
    auth::password::PasswordHasher,
    config::AppConfig,
    error::AppError,
    models::{auth::*, role::Role, user::*},
    repository::user_repo::UserRepository,
    services::{audit_service::AuditService, mailer::Mailer},
};
use sqlx::PgPool;
use std::sync::Arc;

pub struct AuthService {
    db: PgPool,
    codec: Arc<TokenCodec>,
    config: Arc<AppConfig>,
    audit_service: Arc<AuditService>,
    mailer: Arc<dyn Mailer>,
}

impl AuthService {
    pub fn new(
        db: PgPool,
        codec: Arc<TokenCodec>,
        config: Arc<AppConfig>,
        audit_service: Arc<AuditService>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            db,
            codec,
            config,
            audit_service,
            mailer,
        }
    }

    /// 用户登录
    pub async fn login(
        &self,
        req: LoginRequest,
        client_ip: &str,
        user_agent: Option<&str>,
    ) -> Result<LoginResponse, AppError> {
        let user_repo = UserRepository::new(self.db.clone());

        // 获取用户；不存在与密码错误对外同义
        let user: User = match user_repo.find_by_username(&req.username).await? {
            Some(user) => user,
            None => {
                self.audit_service
                    .record_login_event(
                        None,
                        &req.username,
                        "login_failure",
                        Some("unknown_user"),
                        client_ip,
                        user_agent,
                    )
                    .await;
                return Err(AppError::InvalidCredentials);
            }
        };

        // 检查账户状态
        self.check_account_status(&user)?;

        // 检查账户是否处于锁定窗口内
        if let Some(locked_until) = user.locked_until {
            if locked_until > chrono::Utc::now() {
                self.audit_service
                    .record_login_event(
                        Some(user.id),
                        &user.username,
                        "login_failure",
                        Some("account_locked"),
                        client_ip,
                        user_agent,
                    )
                    .await;
                return Err(AppError::AccountLocked);
            }
        }

        // 验证密码；密码不符计入失败并可能触发锁定，
        // 存储的哈希损坏则按内部错误原样上抛
        let hasher = PasswordHasher::new();
        if let Err(e) = hasher.verify(&req.password, &user.password_hash) {
            if matches!(e, AppError::InvalidCredentials) {
                user_repo
                    .record_failed_login(
                        user.id,
                        self.config.security.max_login_attempts,
                        self.config.security.login_lockout_duration_secs,
                    )
                    .await?;

                self.audit_service
                    .record_login_event(
                        Some(user.id),
                        &user.username,
                        "login_failure",
                        Some("bad_password"),
                        client_ip,
                        user_agent,
                    )
                    .await;
            }

            return Err(e);
        }

        // 重置失败次数
        if user.failed_login_attempts > 0 {
            let _ = user_repo.reset_failed_attempts(user.id).await;
        }

        let role = self.user_role(&user)?;

        // 生成令牌对
        let access_token = self.codec.issue(TokenKind::Access, user.id, role)?;
        let refresh_token = self.codec.issue(TokenKind::Refresh, user.id, role)?;

        // 记录成功登录
        self.audit_service
            .record_login_event(
                Some(user.id),
                &user.username,
                "login_success",
                None,
                client_ip,
                user_agent,
            )
            .await;

        Ok(LoginResponse {
            access_token,
            refresh_token,
            expires_in: self.codec.ttl_secs(TokenKind::Access),
            user: UserResponse::from(user),
        })
    }

    /// 刷新令牌：校验 refresh 令牌并签发新令牌对
    pub async fn refresh_token(&self, req: RefreshTokenRequest) -> Result<TokenPair, AppError> {
        let claims = self.codec.parse(TokenKind::Refresh, &req.refresh_token)?;

        // 账户状态可能在令牌有效期内变化，刷新时重新检查
        let user_repo = UserRepository::new(self.db.clone());
        let user: User = user_repo
            .find_by_id(claims.subject)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        self.check_account_status(&user)?;

        // 角色以当前存储为准，而非令牌中的旧声明
        let role = self.user_role(&user)?;

        Ok(TokenPair {
            access_token: self.codec.issue(TokenKind::Access, user.id, role)?,
            refresh_token: self.codec.issue(TokenKind::Refresh, user.id, role)?,
            expires_in: self.codec.ttl_secs(TokenKind::Access),
        })
    }

    /// 请求邮箱验证：签发 email_verify 令牌并交投递方发送。
    /// 地址是否存在不对外泄露。
    pub async fn request_email_verification(&self, email: &str) -> Result<(), AppError> {
        let user_repo = UserRepository::new(self.db.clone());

        let Some(user) = user_repo.find_by_email(email).await? else {
            tracing::debug!("Email verification requested for unknown address");
            return Ok(());
        };

        let role = self.user_role(&user)?;
        let token = self.codec.issue(TokenKind::EmailVerify, user.id, role)?;

        self.mailer.send_email_verification(&user.email, &token).await
    }

    /// 确认邮箱验证令牌
    pub async fn verify_email(&self, token: &str) -> Result<(), AppError> {
        let claims = self.codec.parse(TokenKind::EmailVerify, token)?;

        let user_repo = UserRepository::new(self.db.clone());
        if !user_repo.mark_email_verified(claims.subject).await? {
            return Err(AppError::not_found("user"));
        }

        Ok(())
    }

    /// 发起密码重置：签发 password_reset 令牌并交投递方发送。
    /// 地址是否存在不对外泄露。
    pub async fn forgot_password(&self, email: &str) -> Result<(), AppError> {
        let user_repo = UserRepository::new(self.db.clone());

        let Some(user) = user_repo.find_by_email(email).await? else {
            tracing::debug!("Password reset requested for unknown address");
            return Ok(());
        };

        let role = self.user_role(&user)?;
        let token = self.codec.issue(TokenKind::PasswordReset, user.id, role)?;

        self.mailer.send_password_reset(&user.email, &token).await
    }

    /// 完成密码重置
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        let claims = self.codec.parse(TokenKind::PasswordReset, token)?;

        PasswordHasher::validate_password_policy(new_password, &self.config.security)?;

        let hasher = PasswordHasher::new();
        let password_hash = hasher.hash(new_password)?;

        let user_repo = UserRepository::new(self.db.clone());
        if !user_repo.update_password(claims.subject, &password_hash).await? {
            return Err(AppError::not_found("user"));
        }

        Ok(())
    }

    /// 检查账户状态
    fn check_account_status(&self, user: &User) -> Result<(), AppError> {
        match UserStatus::from(user.status.clone()) {
            UserStatus::Enabled => Ok(()),
            UserStatus::Disabled => Err(AppError::AccountDisabled),
            UserStatus::Locked => Err(AppError::AccountLocked),
        }
    }

    /// 存储中的角色字段必须可解析；否则属数据缺陷
    fn user_role(&self, user: &User) -> Result<Role, AppError> {
        Role::parse(&user.role).ok_or_else(|| {
            tracing::error!(user_id = %user.id, role = %user.role, "Unknown role in storage");
            AppError::internal("unknown role in storage")
        })
    }
}
