//! Security-focused test suite.
//!
//! Session token integrity, credential comparison and the ordering of the
//! gate engines, exercised through the public API only.
//! Run with: `cargo test --test security`

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use makerspace_admin::crypto::verify_credential;
use makerspace_admin::decision::{
    AdminAccessInputs, LoginInputs, SubmissionGateInputs, evaluate_admin_access,
    evaluate_admin_login, evaluate_submission_gate,
};
use makerspace_admin::rate_limit::{FixedWindowLimiter, Limit};
use makerspace_admin::session::{SessionTokenCodec, TokenPayload};
use makerspace_admin::{Clock, ManualClock, SecretString, SiteError};

const SECRET: &str = "0123456789abcdef0123456789abcdef";

fn codec() -> SessionTokenCodec {
    SessionTokenCodec::new(SecretString::new(SECRET), Duration::hours(12)).unwrap()
}

// =============================================================================
// Session tokens
// =============================================================================

#[test]
fn fresh_token_verifies() {
    let codec = codec();
    let token = codec.create_token().unwrap();
    assert!(codec.verify_token(&token));
}

#[test]
fn flipping_any_payload_or_signature_byte_invalidates_token() {
    let codec = codec();
    let token = codec.create_token().unwrap();
    let payload_start = token.find('.').unwrap() + 1;

    for idx in payload_start..token.len() {
        if token.as_bytes()[idx] == b'.' {
            continue;
        }
        let mut bytes = token.clone().into_bytes();
        bytes[idx] = if bytes[idx] == b'x' { b'y' } else { b'x' };
        let tampered = String::from_utf8(bytes).unwrap();

        assert!(!codec.verify_token(&tampered), "byte {idx} flipped");
    }
}

#[test]
fn token_signed_with_other_secret_is_rejected() {
    let other = SessionTokenCodec::new(
        SecretString::new("fedcba9876543210fedcba9876543210"),
        Duration::hours(12),
    )
    .unwrap();
    let token = other.create_token().unwrap();

    assert!(!codec().verify_token(&token));
}

#[test]
fn signed_but_expired_payload_is_rejected() {
    let codec = codec();
    let now = Utc::now().timestamp();
    let token = codec
        .encode(&TokenPayload {
            iat: now - 7200,
            exp: now - 3600,
            nonce: "00".repeat(16),
        })
        .unwrap();

    assert!(!codec.verify_token(&token));
}

#[test]
fn signed_future_dated_payload_is_rejected() {
    let clock = ManualClock::default();
    let codec = codec().with_clock(Arc::new(clock.clone()));
    let now = clock.now().timestamp();

    let within_skew = codec
        .encode(&TokenPayload {
            iat: now + 60,
            exp: now + 3600,
            nonce: "a".into(),
        })
        .unwrap();
    assert!(codec.verify_token(&within_skew));

    let beyond_skew = codec
        .encode(&TokenPayload {
            iat: now + 61,
            exp: now + 3600,
            nonce: "a".into(),
        })
        .unwrap();
    assert!(!codec.verify_token(&beyond_skew));
}

#[test]
fn wrong_shape_or_version_is_rejected() {
    let codec = codec();
    let token = codec.create_token().unwrap();
    let (_, rest) = token.split_once('.').unwrap();

    assert!(!codec.verify_token(""));
    assert!(!codec.verify_token(rest));
    assert!(!codec.verify_token(&format!("{token}.extra")));
    assert!(!codec.verify_token(&format!("v2.{rest}")));
}

#[test]
fn payload_is_readable_but_not_forgeable() {
    let codec = codec();
    let token = codec.create_token().unwrap();
    let parts: Vec<&str> = token.split('.').collect();

    let json = URL_SAFE_NO_PAD.decode(parts[1]).unwrap();
    let mut payload: serde_json::Value = serde_json::from_slice(&json).unwrap();
    payload["exp"] = serde_json::json!(payload["exp"].as_i64().unwrap() + 86_400);
    let forged_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap());

    let forged = format!("{}.{forged_b64}.{}", parts[0], parts[2]);
    assert!(!codec.verify_token(&forged));
}

#[test]
fn short_secret_refuses_to_create_tokens() {
    let result = SessionTokenCodec::new(SecretString::new("short"), Duration::hours(12));
    assert!(matches!(result, Err(SiteError::NotConfigured(_))));
}

// =============================================================================
// Credential comparison
// =============================================================================

#[test]
fn credential_check_fails_closed() {
    assert!(verify_credential("workshop-admin", "workshop-admin"));
    assert!(!verify_credential("", ""));
    assert!(!verify_credential("workshop-admin", ""));
    assert!(!verify_credential("workshop-admin ", "workshop-admin"));
}

// =============================================================================
// Gate ordering
// =============================================================================

#[test]
fn unconfigured_login_never_reveals_later_checks() {
    for is_rate_allowed in [false, true] {
        for is_password_valid in [false, true] {
            let decision = evaluate_admin_login(LoginInputs {
                is_configured: false,
                is_rate_allowed,
                retry_after_seconds: 30,
                is_password_valid,
            });
            assert_eq!(decision.status, 503);
            assert!(!decision.should_create_session);
            assert_eq!(decision.retry_after_seconds, None);
        }
    }
}

#[test]
fn throttled_login_hides_password_result() {
    let inputs = LoginInputs {
        is_configured: true,
        is_rate_allowed: false,
        retry_after_seconds: 17,
        is_password_valid: true,
    };
    let correct = evaluate_admin_login(inputs);
    let wrong = evaluate_admin_login(LoginInputs {
        is_password_valid: false,
        ..inputs
    });

    assert_eq!(correct, wrong);
    assert_eq!(correct.status, 429);
    assert_eq!(correct.retry_after_seconds, Some(17));
}

#[test]
fn admin_gate_checks_session_last() {
    let result = evaluate_admin_access(AdminAccessInputs {
        is_configured: true,
        is_rate_allowed: false,
        retry_after_seconds: 9,
        is_session_valid: true,
    });
    assert_eq!(result, Err(SiteError::TooManyRequests { retry_after: 9 }));
}

#[test]
fn throttled_submission_is_rejected_before_validation() {
    let errors = vec!["Name is required".to_owned()];
    let decision = evaluate_submission_gate(SubmissionGateInputs {
        is_rate_allowed: false,
        retry_after_seconds: 120,
        validation_errors: &errors,
        is_database_configured: false,
    });

    assert_eq!(decision.status, 429);
    assert_eq!(decision.retry_after_seconds, Some(120));
}

// =============================================================================
// Rate limiting
// =============================================================================

#[test]
fn login_budget_is_exact() {
    let clock = ManualClock::default();
    let limiter = FixedWindowLimiter::with_clock(
        "login",
        Limit::new(5, Duration::minutes(15)),
        Arc::new(clock.clone()),
    );

    for _ in 0..5 {
        assert!(limiter.check("login:203.0.113.5").allowed);
    }
    let denied = limiter.check("login:203.0.113.5");
    assert!(!denied.allowed);
    assert!(denied.retry_after_seconds >= 1);

    clock.advance(Duration::minutes(15));
    let decision = limiter.check("login:203.0.113.5");
    assert!(decision.allowed);
    assert_eq!(decision.remaining, 4);
}
