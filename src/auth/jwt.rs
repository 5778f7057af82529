use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use std::sync::Arc;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{
    auth::claims::{Claims, Role},
    config::JwtConfig,
    state::AppState,
};

/// Why a bearer token was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token malformed")]
    Malformed,
    #[error("token signature invalid")]
    SignatureInvalid,
    #[error("token expired")]
    Expired,
}

/// Identity recovered from a verified token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

/// Signing and verification keys with config data. Built once at startup.
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl FromRef<AppState> for Arc<JwtKeys> {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::minutes(cfg.ttl_minutes),
        }
    }

    pub fn issue(&self, user_id: Uuid, role: Role) -> anyhow::Result<String> {
        self.issue_at(user_id, role, OffsetDateTime::now_utc())
    }

    pub fn issue_at(
        &self,
        user_id: Uuid,
        role: Role,
        now: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let claims = Claims {
            sub: user_id,
            role,
            iat: now.unix_timestamp(),
            exp: (now + self.ttl).unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user_id, role = ?role, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// Verifies `token` as of `now`. The signature is checked before expiry, so a
    /// tampered token reports `SignatureInvalid` even when it is also stale.
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<Identity, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::SignatureInvalid
                }
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;

        let claims = data.claims;
        if now.unix_timestamp() > claims.exp {
            return Err(TokenError::Expired);
        }
        debug!(user_id = %claims.sub, role = ?claims.role, "jwt verified");
        Ok(Identity {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 60 * 24,
        })
    }

    fn flip_payload_bit(token: &str) -> String {
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        let mut payload = parts[1].as_bytes().to_vec();
        let mid = payload.len() / 2;
        payload[mid] ^= 0x01;
        let payload = String::from_utf8(payload).unwrap();
        format!("{}.{}.{}", parts[0], payload, parts[2])
    }

    #[test]
    fn issue_then_verify_returns_identity() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let user_id = Uuid::new_v4();
        for role in [Role::User, Role::Admin] {
            let token = keys.issue(user_id, role).expect("sign");
            let identity = keys.verify(&token).expect("verify");
            assert_eq!(identity, Identity { user_id, role });
        }
    }

    #[test]
    fn expired_token_is_rejected_even_with_valid_signature() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let issued = OffsetDateTime::now_utc() - Duration::hours(25);
        let token = keys.issue_at(Uuid::new_v4(), Role::User, issued).unwrap();
        assert_eq!(keys.verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let issued = OffsetDateTime::now_utc();
        let token = keys.issue_at(Uuid::new_v4(), Role::User, issued).unwrap();
        let exp = issued + Duration::hours(24);
        assert!(keys.verify_at(&token, exp).is_ok());
        assert_eq!(
            keys.verify_at(&token, exp + Duration::seconds(1)).unwrap_err(),
            TokenError::Expired
        );
    }

    #[test]
    fn flipped_payload_bit_breaks_signature() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let token = keys.issue(Uuid::new_v4(), Role::User).unwrap();
        let tampered = flip_payload_bit(&token);
        assert_ne!(token, tampered);
        assert_eq!(
            keys.verify(&tampered).unwrap_err(),
            TokenError::SignatureInvalid
        );
    }

    #[test]
    fn tampered_and_expired_reports_signature() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let issued = OffsetDateTime::now_utc() - Duration::days(3);
        let token = keys.issue_at(Uuid::new_v4(), Role::User, issued).unwrap();
        assert_eq!(
            keys.verify(&flip_payload_bit(&token)).unwrap_err(),
            TokenError::SignatureInvalid
        );
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let ours = make_keys("our-secret", "iss", "aud");
        let theirs = make_keys("their-secret", "iss", "aud");
        let token = theirs.issue(Uuid::new_v4(), Role::Admin).unwrap();
        assert_eq!(
            ours.verify(&token).unwrap_err(),
            TokenError::SignatureInvalid
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let keys = make_keys("dev-secret", "iss", "aud");
        for junk in ["", "abc", "a.b", "not.a.token", "...."] {
            assert_eq!(keys.verify(junk).unwrap_err(), TokenError::Malformed, "{junk:?}");
        }
    }

    #[test]
    fn wrong_audience_is_malformed() {
        let good = make_keys("same-secret", "good-iss", "good-aud");
        let other = make_keys("same-secret", "good-iss", "other-aud");
        let token = good.issue(Uuid::new_v4(), Role::User).unwrap();
        assert_eq!(other.verify(&token).unwrap_err(), TokenError::Malformed);
    }
}
