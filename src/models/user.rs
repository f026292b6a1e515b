//! User domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub email_verified: bool,
    pub password_hash: String,

    /// Role name: SUPERADMIN, ADMIN, MEMBER
    pub role: String,

    // Account state
    pub status: String, // enabled, disabled, locked

    // Security policy
    pub failed_login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,

    /// The tenant this user currently operates against.
    /// Last-writer-wins across concurrent switches.
    pub active_tenant_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User status enumeration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Enabled,
    Disabled,
    Locked,
}

impl From<String> for UserStatus {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "enabled" => UserStatus::Enabled,
            "locked" => UserStatus::Locked,
            _ => UserStatus::Disabled,
        }
    }
}

impl From<UserStatus> for String {
    fn from(status: UserStatus) -> Self {
        match status {
            UserStatus::Enabled => "enabled".to_string(),
            UserStatus::Disabled => "disabled".to_string(),
            UserStatus::Locked => "locked".to_string(),
        }
    }
}

/// User response (without sensitive data)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub email_verified: bool,
    pub role: String,
    pub status: String,
    pub active_tenant_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            email_verified: user.email_verified,
            role: user.role,
            status: user.status,
            active_tenant_id: user.active_tenant_id,
            created_at: user.created_at,
        }
    }
}
