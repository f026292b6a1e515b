//! Tenant domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An isolated customer/organization scope.
/// Most platform resources are implicitly scoped to one tenant.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    /// URL-safe unique identifier (e.g., `acme-press`)
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// Switch active tenant request
#[derive(Debug, Deserialize)]
pub struct SwitchTenantRequest {
    pub tenant_id: Uuid,
}

/// Grant membership request (superadmin surface)
#[derive(Debug, Deserialize)]
pub struct GrantMembershipRequest {
    pub user_id: Uuid,
}
