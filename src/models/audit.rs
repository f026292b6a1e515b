//! Audit domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audit entry. Append-only; never updated or deleted by this service.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditEntry {
    pub id: Uuid,
    /// Best-effort actor; null for unauthenticated requests
    pub actor_id: Option<Uuid>,
    /// Entity the request operated on, derived from the path (e.g. "users")
    pub entity_type: String,
    /// Verb plus path, e.g. "POST /api/v1/users"
    pub action: String,
    /// Raw query string, if any
    pub detail: Option<String>,
    /// Captured request body
    pub old_value: Option<serde_json::Value>,
    /// Captured response body
    pub new_value: Option<serde_json::Value>,
    pub source_ip: Option<String>,
    pub user_agent: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Audit entry filters
#[derive(Debug, Default, Deserialize)]
pub struct AuditEntryFilters {
    pub actor_id: Option<Uuid>,
    pub entity_type: Option<String>,
    pub action: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Login event
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LoginEvent {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub username: String,
    /// login_success / login_failure
    pub event_type: String,
    pub failure_reason: Option<String>,
    pub source_ip: String,
    pub user_agent: Option<String>,
    pub occurred_at: DateTime<Utc>,
}
