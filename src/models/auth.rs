//! Authentication-related models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 128))]
    pub username: String,
    #[validate(length(min = 1, max = 512))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub user: super::user::UserResponse,
}

/// Access + refresh token pair
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until the access token expires
    pub expires_in: u64,
}

/// Token refresh request
#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Request a verification mail for the given address
#[derive(Debug, Deserialize, Validate)]
pub struct RequestEmailVerification {
    #[validate(email)]
    pub email: String,
}

/// Confirm an email address with a verification token
#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

/// Start the password-reset flow
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

/// Complete the password-reset flow
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    pub token: String,
    #[validate(length(min = 1, max = 512))]
    pub new_password: String,
}

/// Token introspection request (service-to-service)
#[derive(Debug, Deserialize)]
pub struct IntrospectRequest {
    pub token: String,
}

/// Token introspection response.
/// An invalid token yields `valid: false` with empty fields, not a 401.
#[derive(Debug, Serialize)]
pub struct IntrospectResponse {
    pub valid: bool,
    pub user_id: Option<Uuid>,
    pub role: Option<String>,
    pub is_superadmin: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl IntrospectResponse {
    pub fn inactive() -> Self {
        Self {
            valid: false,
            user_id: None,
            role: None,
            is_superadmin: false,
            expires_at: None,
        }
    }
}
