//! Token issuance and verification for the four platform token kinds.
//!
//! Every kind is signed with its own secret and carries its own expiry
//! policy, so a token of one kind presented where another is expected
//! fails signature verification outright. Parsing is pure: no I/O, and
//! the outcome depends only on the secret material and the wall clock.

use crate::{config::SecurityConfig, error::AppError, models::role::Role};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The four platform token kinds. Kinds never share signing secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
    EmailVerify,
    PasswordReset,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
            TokenKind::EmailVerify => "email_verify",
            TokenKind::PasswordReset => "password_reset",
        }
    }

    pub const ALL: [TokenKind; 4] = [
        TokenKind::Access,
        TokenKind::Refresh,
        TokenKind::EmailVerify,
        TokenKind::PasswordReset,
    ];
}

/// Wire-format JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
struct Claims {
    /// Subject (user ID)
    sub: String,
    /// Role name
    role: String,
    /// Token kind discriminator
    token_type: String,
    /// Issued at
    iat: i64,
    /// Expiration
    exp: i64,
    /// JWT ID (unique token identifier)
    jti: String,
}

/// Verified, typed claims. Produced exactly once per parse; downstream
/// code never re-inspects raw claim maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub subject: Uuid,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

struct KindKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl KindKeys {
    fn new(secret: &str, ttl_secs: u64) -> Result<Self, AppError> {
        // HS256 密钥至少 32 字符
        if secret.len() < 32 {
            return Err(AppError::Config("Token secret too short (min 32 chars)".to_string()));
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        })
    }
}

/// Token codec over the four kinds
pub struct TokenCodec {
    access: KindKeys,
    refresh: KindKeys,
    email_verify: KindKeys,
    password_reset: KindKeys,
}

impl TokenCodec {
    /// Create the codec from security config
    pub fn from_config(config: &SecurityConfig) -> Result<Self, AppError> {
        Ok(Self {
            access: KindKeys::new(
                config.access_token_secret.expose_secret(),
                config.access_token_exp_secs,
            )?,
            refresh: KindKeys::new(
                config.refresh_token_secret.expose_secret(),
                config.refresh_token_exp_secs,
            )?,
            email_verify: KindKeys::new(
                config.email_verify_token_secret.expose_secret(),
                config.email_verify_token_exp_secs,
            )?,
            password_reset: KindKeys::new(
                config.password_reset_token_secret.expose_secret(),
                config.password_reset_token_exp_secs,
            )?,
        })
    }

    fn keys(&self, kind: TokenKind) -> &KindKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
            TokenKind::EmailVerify => &self.email_verify,
            TokenKind::PasswordReset => &self.password_reset,
        }
    }

    /// Seconds a freshly issued token of this kind lives
    pub fn ttl_secs(&self, kind: TokenKind) -> u64 {
        self.keys(kind).ttl_secs
    }

    /// Issue a signed token of the given kind. TTL comes from
    /// deployment config, never from the call site.
    pub fn issue(&self, kind: TokenKind, user_id: Uuid, role: Role) -> Result<String, AppError> {
        let keys = self.keys(kind);
        let now = Utc::now();
        let expiration = now + Duration::seconds(keys.ttl_secs as i64);

        let claims = Claims {
            sub: user_id.to_string(),
            role: role.as_str().to_string(),
            token_type: kind.as_str().to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &keys.encoding).map_err(|e| {
            tracing::error!("Failed to encode {} token: {:?}", kind.as_str(), e);
            AppError::Internal(format!("Failed to encode token: {}", e))
        })
    }

    /// Verify and decode a token, expecting the given kind.
    ///
    /// Strict expiry: no clock-skew leeway. Failures are split into
    /// expired / bad signature / malformed for diagnostics only — all
    /// three are 401 for trust decisions.
    pub fn parse(&self, kind: TokenKind, token: &str) -> Result<TokenClaims, AppError> {
        let keys = self.keys(kind);

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &keys.decoding, &validation)
            .map_err(|e| {
                tracing::debug!("Token validation failed: {:?}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::InvalidTokenSignature
                    }
                    _ => AppError::InvalidToken,
                }
            })?
            .claims;

        // 密钥按种类隔离已保证跨种类拒绝，这里再校验种类声明
        if claims.token_type != kind.as_str() {
            tracing::debug!(
                "Token kind mismatch: expected '{}', got '{}'",
                kind.as_str(),
                claims.token_type
            );
            return Err(AppError::InvalidToken);
        }

        let subject = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;
        let role = Role::parse(&claims.role).ok_or(AppError::InvalidToken)?;

        Ok(TokenClaims {
            subject,
            role,
            issued_at: Utc.timestamp_opt(claims.iat, 0).single().ok_or(AppError::InvalidToken)?,
            expires_at: Utc.timestamp_opt(claims.exp, 0).single().ok_or(AppError::InvalidToken)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn test_security_config() -> SecurityConfig {
        SecurityConfig {
            access_token_secret: Secret::new("access-test-secret-32-characters-ok!".to_string()),
            refresh_token_secret: Secret::new("refresh-test-secret-32-characters-ok".to_string()),
            email_verify_token_secret: Secret::new(
                "email-verify-test-secret-32-chars-ok".to_string(),
            ),
            password_reset_token_secret: Secret::new(
                "password-reset-test-secret-32-chars!".to_string(),
            ),
            access_token_exp_secs: 900,
            refresh_token_exp_secs: 604800,
            email_verify_token_exp_secs: 86400,
            password_reset_token_exp_secs: 3600,
            password_min_length: 8,
            password_require_uppercase: true,
            password_require_digit: true,
            password_require_special: false,
            max_login_attempts: 5,
            login_lockout_duration_secs: 1800,
            trust_proxy: true,
            api_keys: None,
        }
    }

    #[test]
    fn test_issue_and_parse_same_kind() {
        let codec = TokenCodec::from_config(&test_security_config()).unwrap();
        let user_id = Uuid::new_v4();

        for kind in TokenKind::ALL {
            let token = codec.issue(kind, user_id, Role::Admin).unwrap();
            let claims = codec.parse(kind, &token).unwrap();
            assert_eq!(claims.subject, user_id);
            assert_eq!(claims.role, Role::Admin);
            assert!(claims.expires_at > claims.issued_at);
        }
    }

    #[test]
    fn test_cross_kind_rejection() {
        let codec = TokenCodec::from_config(&test_security_config()).unwrap();
        let user_id = Uuid::new_v4();

        for issued_kind in TokenKind::ALL {
            let token = codec.issue(issued_kind, user_id, Role::Member).unwrap();
            for expected_kind in TokenKind::ALL {
                if expected_kind == issued_kind {
                    continue;
                }
                // 不同密钥签名 → 签名校验失败
                let err = codec.parse(expected_kind, &token).unwrap_err();
                assert!(
                    matches!(err, AppError::InvalidTokenSignature),
                    "{} parsed as {} should fail signature check, got {:?}",
                    issued_kind.as_str(),
                    expected_kind.as_str(),
                    err
                );
            }
        }
    }

    #[test]
    fn test_expired_token() {
        let config = test_security_config();
        let codec = TokenCodec::from_config(&config).unwrap();

        // 直接构造已过期的声明并用相同密钥签名
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            role: "ADMIN".to_string(),
            token_type: "access".to_string(),
            iat: (now - Duration::seconds(120)).timestamp(),
            exp: (now - Duration::seconds(60)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.access_token_secret.expose_secret().as_bytes()),
        )
        .unwrap();

        let err = codec.parse(TokenKind::Access, &token).unwrap_err();
        assert!(matches!(err, AppError::TokenExpired));
    }

    #[test]
    fn test_malformed_token() {
        let codec = TokenCodec::from_config(&test_security_config()).unwrap();
        let err = codec.parse(TokenKind::Access, "not-a-jwt").unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn test_unknown_role_rejected() {
        let config = test_security_config();
        let codec = TokenCodec::from_config(&config).unwrap();

        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            role: "WIZARD".to_string(),
            token_type: "access".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(60)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.access_token_secret.expose_secret().as_bytes()),
        )
        .unwrap();

        let err = codec.parse(TokenKind::Access, &token).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn test_reparse_is_idempotent() {
        let codec = TokenCodec::from_config(&test_security_config()).unwrap();
        let token = codec.issue(TokenKind::Refresh, Uuid::new_v4(), Role::Member).unwrap();

        let first = codec.parse(TokenKind::Refresh, &token).unwrap();
        let second = codec.parse(TokenKind::Refresh, &token).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_secret_too_short() {
        let mut config = test_security_config();
        config.refresh_token_secret = Secret::new("short".to_string());
        assert!(TokenCodec::from_config(&config).is_err());
    }

    #[test]
    fn test_kind_specific_ttl() {
        let codec = TokenCodec::from_config(&test_security_config()).unwrap();
        assert_eq!(codec.ttl_secs(TokenKind::Access), 900);
        assert_eq!(codec.ttl_secs(TokenKind::Refresh), 604800);
        assert_eq!(codec.ttl_secs(TokenKind::EmailVerify), 86400);
        assert_eq!(codec.ttl_secs(TokenKind::PasswordReset), 3600);

        let token = codec.issue(TokenKind::PasswordReset, Uuid::new_v4(), Role::Member).unwrap();
        let claims = codec.parse(TokenKind::PasswordReset, &token).unwrap();
        assert_eq!((claims.expires_at - claims.issued_at).num_seconds(), 3600);
    }
}
