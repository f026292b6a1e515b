//! 集成测试公共工具

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use media_system::{
    auth::jwt::TokenCodec,
    auth::remote::{RemoteVerdict, SuperAdminValidator},
    config::*,
    error::AppError,
    middleware::AppState,
    models::tenant::Tenant,
    repository::membership_repo::MembershipStore,
    services::{AuditService, AuthService, LogMailer, TenantService},
};
use secrecy::Secret;
use sqlx::postgres::PgPoolOptions;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// 创建测试配置
pub fn create_test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            addr: "127.0.0.1:3000".to_string(),
            graceful_shutdown_timeout_secs: 30,
        },
        database: DatabaseConfig {
            url: Secret::new("postgresql://localhost/test".to_string()),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        },
        logging: LoggingConfig {
            level: "info".to_string(),
            format: "json".to_string(),
        },
        security: SecurityConfig {
            access_token_secret: Secret::new("access-test-secret-32-characters-ok!".to_string()),
            refresh_token_secret: Secret::new("refresh-test-secret-32-characters-ok".to_string()),
            email_verify_token_secret: Secret::new(
                "email-verify-test-secret-32-chars-ok".to_string(),
            ),
            password_reset_token_secret: Secret::new(
                "password-reset-test-secret-32-chars!".to_string(),
            ),
            access_token_exp_secs: 900,
            refresh_token_exp_secs: 604800,
            email_verify_token_exp_secs: 86400,
            password_reset_token_exp_secs: 3600,
            password_min_length: 8,
            password_require_uppercase: true,
            password_require_digit: true,
            password_require_special: false,
            max_login_attempts: 5,
            login_lockout_duration_secs: 1800,
            trust_proxy: true,
            api_keys: None,
        },
        remote_validator: RemoteValidatorConfig {
            endpoint: "http://localhost:4000/api/v1/internal/validate-superadmin".to_string(),
            timeout_secs: 2,
        },
        audit: AuditConfig {
            excluded_path_prefixes: vec![
                "/health".to_string(),
                "/ready".to_string(),
                "/metrics".to_string(),
                "/favicon.ico".to_string(),
                "/static".to_string(),
            ],
            max_body_bytes: 1024 * 1024,
        },
    }
}

/// 内存版成员关系存储，避免测试依赖数据库
#[derive(Default)]
pub struct InMemoryMembershipStore {
    tenants: Mutex<HashMap<Uuid, Tenant>>,
    /// (user, tenant) -> is_active
    memberships: Mutex<HashMap<(Uuid, Uuid), bool>>,
    active: Mutex<HashMap<Uuid, Uuid>>,
}

impl InMemoryMembershipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tenant(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        let tenant = Tenant {
            id,
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            created_at: Utc::now(),
        };
        self.tenants.lock().unwrap().insert(id, tenant);
        id
    }

    pub fn add_membership(&self, user_id: Uuid, tenant_id: Uuid, is_active: bool) {
        self.memberships.lock().unwrap().insert((user_id, tenant_id), is_active);
    }
}

#[async_trait]
impl MembershipStore for InMemoryMembershipStore {
    async fn is_active_member(&self, user_id: Uuid, tenant_id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .memberships
            .lock()
            .unwrap()
            .get(&(user_id, tenant_id))
            .copied()
            .unwrap_or(false))
    }

    async fn list_active_tenants(&self, user_id: Uuid) -> Result<Vec<Tenant>, AppError> {
        let memberships = self.memberships.lock().unwrap();
        let tenants = self.tenants.lock().unwrap();

        let mut result: Vec<Tenant> = memberships
            .iter()
            .filter(|((u, _), active)| *u == user_id && **active)
            .filter_map(|((_, t), _)| tenants.get(t).cloned())
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(result)
    }

    async fn get_active_tenant(&self, user_id: Uuid) -> Result<Option<Uuid>, AppError> {
        Ok(self.active.lock().unwrap().get(&user_id).copied())
    }

    async fn set_active_tenant(&self, user_id: Uuid, tenant_id: Uuid) -> Result<(), AppError> {
        self.active.lock().unwrap().insert(user_id, tenant_id);
        Ok(())
    }

    async fn find_tenant(&self, tenant_id: Uuid) -> Result<Option<Tenant>, AppError> {
        Ok(self.tenants.lock().unwrap().get(&tenant_id).cloned())
    }

    async fn list_all_tenants(&self) -> Result<Vec<Tenant>, AppError> {
        let mut tenants: Vec<Tenant> = self.tenants.lock().unwrap().values().cloned().collect();
        tenants.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tenants)
    }

    async fn grant_membership(&self, user_id: Uuid, tenant_id: Uuid) -> Result<(), AppError> {
        self.memberships.lock().unwrap().insert((user_id, tenant_id), true);
        Ok(())
    }

    async fn deactivate_membership(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<bool, AppError> {
        let mut memberships = self.memberships.lock().unwrap();
        match memberships.get_mut(&(user_id, tenant_id)) {
            Some(active) if *active => {
                *active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// 可编程的远程校验桩
pub enum StubValidator {
    /// valid=true, is_superadmin=true
    Approve,
    /// valid=true, is_superadmin=false —— 远程裁决优先于本地声明
    Deny,
    /// valid=false
    Invalid,
    /// 网络错误/超时（fail-closed 路径）
    Unreachable,
}

#[async_trait]
impl SuperAdminValidator for StubValidator {
    async fn validate_token(&self, _bearer_token: &str) -> Result<RemoteVerdict, AppError> {
        match self {
            StubValidator::Approve => Ok(RemoteVerdict {
                user_id: Some(Uuid::new_v4()),
                user_role: Some("SUPERADMIN".to_string()),
                is_superadmin: true,
                valid: true,
            }),
            StubValidator::Deny => Ok(RemoteVerdict {
                user_id: Some(Uuid::new_v4()),
                user_role: Some("MEMBER".to_string()),
                is_superadmin: false,
                valid: true,
            }),
            StubValidator::Invalid => Ok(RemoteVerdict {
                user_id: None,
                user_role: None,
                is_superadmin: false,
                valid: false,
            }),
            StubValidator::Unreachable => {
                Err(AppError::RemoteValidation("stub validator unreachable".to_string()))
            }
        }
    }
}

/// 组装测试 AppState。
/// 连接池为惰性创建，不触达数据库的路径可以直接测试。
pub fn create_test_app_state(
    config: AppConfig,
    store: Arc<dyn MembershipStore>,
    validator: Arc<dyn SuperAdminValidator>,
) -> Arc<AppState> {
    let db = PgPoolOptions::new()
        .connect_lazy("postgresql://localhost/test")
        .expect("lazy pool");

    let token_codec =
        Arc::new(TokenCodec::from_config(&config.security).expect("test token codec"));
    let audit_service = Arc::new(AuditService::new(db.clone()));

    let auth_service = Arc::new(AuthService::new(
        db.clone(),
        token_codec.clone(),
        Arc::new(config.clone()),
        audit_service.clone(),
        Arc::new(LogMailer),
    ));

    let tenant_service = Arc::new(TenantService::new(store));

    Arc::new(AppState {
        config,
        db,
        token_codec,
        auth_service,
        tenant_service,
        audit_service,
        superadmin_validator: validator,
    })
}
