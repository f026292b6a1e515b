//! Role domain model
//!
//! Roles form a closed set. Claims carry the role as a string on the
//! wire, but it is converted into [`Role`] exactly once when a token is
//! parsed; everything downstream matches on the enum.

use serde::{Deserialize, Serialize};

/// Platform role. SUPERADMIN has implicit membership in every tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "SUPERADMIN")]
    SuperAdmin,
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "MEMBER")]
    Member,
}

impl Role {
    /// Canonical (uppercase) claim representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPERADMIN",
            Role::Admin => "ADMIN",
            Role::Member => "MEMBER",
        }
    }

    /// Case-insensitive parse; unknown names are rejected by the caller
    pub fn parse(s: &str) -> Option<Role> {
        if s.eq_ignore_ascii_case("SUPERADMIN") {
            Some(Role::SuperAdmin)
        } else if s.eq_ignore_ascii_case("ADMIN") {
            Some(Role::Admin)
        } else if s.eq_ignore_ascii_case("MEMBER") {
            Some(Role::Member)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
