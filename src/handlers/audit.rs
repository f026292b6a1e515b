//! 审计日志的 HTTP 处理器

use crate::{error::AppError, middleware::AppState, models::audit::*};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct AuditEntryQuery {
    pub actor_id: Option<uuid::Uuid>,
    pub entity_type: Option<String>,
    pub action: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize)]
pub struct LoginEventQuery {
    pub user_id: Option<uuid::Uuid>,
    pub event_type: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

/// 查询审计条目（管理员角色门在路由层）
pub async fn list_audit_entries(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuditEntryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filters = AuditEntryFilters {
        actor_id: query.actor_id,
        entity_type: query.entity_type,
        action: query.action,
        start_time: query.start_time,
        end_time: query.end_time,
    };

    let entries = state.audit_service.query_entries(&filters, query.limit, query.offset).await?;
    let total = state.audit_service.count_entries(&filters).await?;

    Ok(Json(json!({
        "entries": entries,
        "count": entries.len(),
        "total": total
    })))
}

/// 查询登录事件
pub async fn list_login_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LoginEventQuery>,
) -> Result<impl IntoResponse, AppError> {
    let events = state
        .audit_service
        .query_login_events(query.user_id, query.event_type.as_deref(), query.limit)
        .await?;

    Ok(Json(json!({
        "events": events,
        "count": events.len()
    })))
}
