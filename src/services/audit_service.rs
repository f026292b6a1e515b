//! 审计服务
//!
//! 审计是次要的可观测性关注点，不属于主操作的正确性契约：
//! 写入失败只记日志、不影响客户端响应。

use crate::{error::AppError, models::audit::*, repository::audit_repo::AuditRepository};
use sqlx::PgPool;
use uuid::Uuid;

pub struct AuditService {
    db: PgPool,
}

impl AuditService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 写入一条审计条目
    pub async fn record_entry(&self, entry: AuditEntry) -> Result<(), AppError> {
        let repo = AuditRepository::new(self.db.clone());
        repo.insert_entry(&entry).await
    }

    /// 在响应送出后异步写入审计条目（fire-and-forget）。
    /// 失败只告警，绝不反馈到请求路径。
    pub fn record_entry_detached(&self, entry: AuditEntry) {
        let db = self.db.clone();
        tokio::spawn(async move {
            let repo = AuditRepository::new(db);
            if let Err(e) = repo.insert_entry(&entry).await {
                tracing::warn!(error = %e, "Audit write failed; entry dropped");
            }
        });
    }

    /// 记录登录事件。失败同样只记日志。
    pub async fn record_login_event(
        &self,
        user_id: Option<Uuid>,
        username: &str,
        event_type: &str,
        failure_reason: Option<&str>,
        source_ip: &str,
        user_agent: Option<&str>,
    ) {
        let event = LoginEvent {
            id: Uuid::new_v4(),
            user_id,
            username: username.to_string(),
            event_type: event_type.to_string(),
            failure_reason: failure_reason.map(|s| s.to_string()),
            source_ip: source_ip.to_string(),
            user_agent: user_agent.map(|s| s.to_string()),
            occurred_at: chrono::Utc::now(),
        };

        let repo = AuditRepository::new(self.db.clone());
        if let Err(e) = repo.record_login_event(&event).await {
            tracing::warn!(error = %e, "Login event write failed; event dropped");
        }
    }

    /// 查询审计条目
    pub async fn query_entries(
        &self,
        filters: &AuditEntryFilters,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditEntry>, AppError> {
        let repo = AuditRepository::new(self.db.clone());
        repo.query_entries(filters, limit, offset).await
    }

    /// 查询审计条目数量
    pub async fn count_entries(&self, filters: &AuditEntryFilters) -> Result<i64, AppError> {
        let repo = AuditRepository::new(self.db.clone());
        repo.count_entries(filters).await
    }

    /// 查询登录事件
    pub async fn query_login_events(
        &self,
        user_id: Option<Uuid>,
        event_type: Option<&str>,
        limit: i64,
    ) -> Result<Vec<LoginEvent>, AppError> {
        let repo = AuditRepository::new(self.db.clone());
        repo.query_login_events(user_id, event_type, limit).await
    }
}
