//! Authentication and authorization module

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod remote;

pub use jwt::{TokenClaims, TokenCodec, TokenKind};
pub use middleware::{
    access_auth_middleware, extract_bearer, role_gate_middleware,
    superadmin_validation_middleware, tenant_scope_middleware, AuthContext, TenantScope,
};
pub use password::PasswordHasher;
pub use remote::{HttpSuperAdminValidator, RemoteVerdict, SuperAdminValidator};
