//! Business logic services layer

pub mod audit_service;
pub mod auth_service;
pub mod mailer;
pub mod tenant_service;

pub use audit_service::AuditService;
pub use auth_service::AuthService;
pub use mailer::{LogMailer, Mailer};
pub use tenant_service::TenantService;
