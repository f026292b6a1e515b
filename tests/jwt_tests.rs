//! 令牌编解码器单元测试
//!
//! 测试四种令牌的签发、验证与跨种类拒绝

use media_system::auth::jwt::{TokenCodec, TokenKind};
use media_system::models::role::Role;
use uuid::Uuid;

mod common;

fn codec() -> TokenCodec {
    TokenCodec::from_config(&common::create_test_config().security).unwrap()
}

#[test]
fn test_codec_creation_from_config() {
    let config = common::create_test_config();
    assert!(TokenCodec::from_config(&config.security).is_ok());
}

#[test]
fn test_each_kind_round_trips_within_ttl() {
    let codec = codec();
    let user_id = Uuid::new_v4();

    for kind in TokenKind::ALL {
        let token = codec.issue(kind, user_id, Role::Member).unwrap();
        let claims = codec.parse(kind, &token).unwrap();

        assert_eq!(claims.subject, user_id);
        assert_eq!(claims.role, Role::Member);
        assert_eq!(
            (claims.expires_at - claims.issued_at).num_seconds() as u64,
            codec.ttl_secs(kind),
        );
    }
}

#[test]
fn test_kind_isolation() {
    let codec = codec();
    let user_id = Uuid::new_v4();

    // 任一种类签发的令牌在其它三个种类下都必须被拒绝
    for issued in TokenKind::ALL {
        let token = codec.issue(issued, user_id, Role::Admin).unwrap();
        for expected in TokenKind::ALL {
            if expected == issued {
                assert!(codec.parse(expected, &token).is_ok());
            } else {
                assert!(codec.parse(expected, &token).is_err());
            }
        }
    }
}

#[test]
fn test_access_ttl_applied() {
    let config = common::create_test_config();
    let codec = TokenCodec::from_config(&config.security).unwrap();
    let token = codec.issue(TokenKind::Access, Uuid::new_v4(), Role::Admin).unwrap();
    let claims = codec.parse(TokenKind::Access, &token).unwrap();

    assert_eq!(
        (claims.expires_at - claims.issued_at).num_seconds() as u64,
        config.security.access_token_exp_secs,
    );
}

#[test]
fn test_garbage_rejected() {
    let codec = codec();
    assert!(codec.parse(TokenKind::Access, "garbage").is_err());
    assert!(codec.parse(TokenKind::Refresh, "").is_err());
    assert!(codec.parse(TokenKind::EmailVerify, "a.b.c").is_err());
}

#[test]
fn test_reparse_yields_identical_claims() {
    let codec = codec();
    let token = codec.issue(TokenKind::Access, Uuid::new_v4(), Role::SuperAdmin).unwrap();

    let first = codec.parse(TokenKind::Access, &token).unwrap();
    let second = codec.parse(TokenKind::Access, &token).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_superadmin_flagged_in_claims() {
    let codec = codec();
    let token = codec.issue(TokenKind::Access, Uuid::new_v4(), Role::SuperAdmin).unwrap();
    let claims = codec.parse(TokenKind::Access, &token).unwrap();

    assert_eq!(claims.role, Role::SuperAdmin);
}
