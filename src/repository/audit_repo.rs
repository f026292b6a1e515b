//! Audit repository (审计数据访问)
//!
//! 审计表只追加：本层只提供插入与查询，没有更新和删除。

use crate::{error::AppError, models::audit::*};
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub struct AuditRepository {
    db: PgPool,
}

impl AuditRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ==================== Audit Entries ====================

    /// 插入审计条目
    pub async fn insert_entry(&self, entry: &AuditEntry) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO audit_entries (
                id, actor_id, entity_type, action, detail, old_value, new_value,
                source_ip, user_agent, occurred_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(entry.id)
        .bind(entry.actor_id)
        .bind(&entry.entity_type)
        .bind(&entry.action)
        .bind(&entry.detail)
        .bind(&entry.old_value)
        .bind(&entry.new_value)
        .bind(&entry.source_ip)
        .bind(&entry.user_agent)
        .bind(entry.occurred_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// 查询审计条目
    pub async fn query_entries(
        &self,
        filters: &AuditEntryFilters,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditEntry>, AppError> {
        let mut query = String::from("SELECT * FROM audit_entries WHERE 1=1");
        let mut index = 0;

        if filters.actor_id.is_some() {
            index += 1;
            query.push_str(&format!(" AND actor_id = ${}", index));
        }
        if filters.entity_type.is_some() {
            index += 1;
            query.push_str(&format!(" AND entity_type = ${}", index));
        }
        if filters.action.is_some() {
            index += 1;
            query.push_str(&format!(" AND action = ${}", index));
        }
        if filters.start_time.is_some() {
            index += 1;
            query.push_str(&format!(" AND occurred_at >= ${}", index));
        }
        if filters.end_time.is_some() {
            index += 1;
            query.push_str(&format!(" AND occurred_at <= ${}", index));
        }

        query.push_str(&format!(
            " ORDER BY occurred_at DESC LIMIT ${} OFFSET ${}",
            index + 1,
            index + 2
        ));

        let mut query_builder = sqlx::query_as::<_, AuditEntry>(&query);

        if let Some(actor_id) = filters.actor_id {
            query_builder = query_builder.bind(actor_id);
        }
        if let Some(entity_type) = &filters.entity_type {
            query_builder = query_builder.bind(entity_type);
        }
        if let Some(action) = &filters.action {
            query_builder = query_builder.bind(action);
        }
        if let Some(start_time) = filters.start_time {
            query_builder = query_builder.bind(start_time);
        }
        if let Some(end_time) = filters.end_time {
            query_builder = query_builder.bind(end_time);
        }

        let entries = query_builder.bind(limit).bind(offset).fetch_all(&self.db).await?;

        Ok(entries)
    }

    /// 统计审计条目数量
    pub async fn count_entries(&self, filters: &AuditEntryFilters) -> Result<i64, AppError> {
        let mut query = String::from("SELECT COUNT(*) FROM audit_entries WHERE 1=1");
        let mut index = 0;

        if filters.actor_id.is_some() {
            index += 1;
            query.push_str(&format!(" AND actor_id = ${}", index));
        }
        if filters.entity_type.is_some() {
            index += 1;
            query.push_str(&format!(" AND entity_type = ${}", index));
        }
        if filters.action.is_some() {
            index += 1;
            query.push_str(&format!(" AND action = ${}", index));
        }
        if filters.start_time.is_some() {
            index += 1;
            query.push_str(&format!(" AND occurred_at >= ${}", index));
        }
        if filters.end_time.is_some() {
            index += 1;
            query.push_str(&format!(" AND occurred_at <= ${}", index));
        }

        let mut query_builder = sqlx::query(&query);

        if let Some(actor_id) = filters.actor_id {
            query_builder = query_builder.bind(actor_id);
        }
        if let Some(entity_type) = &filters.entity_type {
            query_builder = query_builder.bind(entity_type);
        }
        if let Some(action) = &filters.action {
            query_builder = query_builder.bind(action);
        }
        if let Some(start_time) = filters.start_time {
            query_builder = query_builder.bind(start_time);
        }
        if let Some(end_time) = filters.end_time {
            query_builder = query_builder.bind(end_time);
        }

        let count: i64 = query_builder.fetch_one(&self.db).await?.get(0);
        Ok(count)
    }

    // ==================== Login Events ====================

    /// 记录登录事件
    pub async fn record_login_event(&self, event: &LoginEvent) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO login_events (
                id, user_id, username, event_type, failure_reason,
                source_ip, user_agent, occurred_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(event.id)
        .bind(event.user_id)
        .bind(&event.username)
        .bind(&event.event_type)
        .bind(&event.failure_reason)
        .bind(&event.source_ip)
        .bind(&event.user_agent)
        .bind(event.occurred_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// 查询登录事件
    pub async fn query_login_events(
        &self,
        user_id: Option<Uuid>,
        event_type: Option<&str>,
        limit: i64,
    ) -> Result<Vec<LoginEvent>, AppError> {
        let mut query = String::from("SELECT * FROM login_events WHERE 1=1");
        let mut index = 0;

        if user_id.is_some() {
            index += 1;
            query.push_str(&format!(" AND user_id = ${}", index));
        }
        if event_type.is_some() {
            index += 1;
            query.push_str(&format!(" AND event_type = ${}", index));
        }

        query.push_str(&format!(" ORDER BY occurred_at DESC LIMIT ${}", index + 1));

        let mut query_builder = sqlx::query_as::<_, LoginEvent>(&query);

        if let Some(user_id) = user_id {
            query_builder = query_builder.bind(user_id);
        }
        if let Some(event_type) = event_type {
            query_builder = query_builder.bind(event_type);
        }

        let events = query_builder.bind(limit).fetch_all(&self.db).await?;

        Ok(events)
    }
}
