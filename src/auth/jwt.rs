use std::time::Duration;

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::Claims;
use crate::config::{JwtConfig, MAX_TTL_MINUTES};

/// Why a presented token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
}

/// Signing and verification keys plus the claims every token carries.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs(cfg.ttl_minutes.clamp(1, MAX_TTL_MINUTES) as u64 * 60),
        }
    }

    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.issue_at(user_id, OffsetDateTime::now_utc())
    }

    /// Signs a token for `user_id` as if the clock read `now`.
    pub fn issue_at(&self, user_id: Uuid, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = now
            .checked_add(TimeDuration::seconds(self.ttl.as_secs() as i64))
            .ok_or_else(|| anyhow::anyhow!("token expiry out of range"))?;
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user_id, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, VerificationError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// Checks structure, then signature (and issuer/audience), then expiry against `now`.
    /// Never touches the store.
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, VerificationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is checked below against the caller's clock, without leeway
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidIssuer
                | ErrorKind::InvalidAudience => VerificationError::InvalidSignature,
                _ => VerificationError::Malformed,
            })?
            .claims;

        if now.unix_timestamp() >= claims.exp {
            return Err(VerificationError::Expired);
        }
        debug!(user_id = %claims.sub, "jwt verified");
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 60,
        })
    }

    #[test]
    fn sign_and_verify_token() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id).expect("sign");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.exp - claims.iat, 60 * 60);
    }

    #[test]
    fn token_is_valid_until_the_last_second() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let issued = OffsetDateTime::now_utc();
        let token = keys.issue_at(Uuid::new_v4(), issued).unwrap();
        let just_before = issued + TimeDuration::seconds(60 * 60 - 1);
        assert!(keys.verify_at(&token, just_before).is_ok());
    }

    #[test]
    fn token_expires_at_issued_plus_ttl() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let issued = OffsetDateTime::now_utc();
        let token = keys.issue_at(Uuid::new_v4(), issued).unwrap();
        let at_expiry = issued + TimeDuration::minutes(60);
        assert_eq!(
            keys.verify_at(&token, at_expiry),
            Err(VerificationError::Expired)
        );
        assert_eq!(
            keys.verify_at(&token, at_expiry + TimeDuration::days(3)),
            Err(VerificationError::Expired)
        );
    }

    #[test]
    fn oversized_ttl_is_clamped() {
        let keys = JwtKeys::from_config(&JwtConfig {
            secret: "s".into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_minutes: i64::MAX,
        });
        assert_eq!(keys.ttl.as_secs(), MAX_TTL_MINUTES as u64 * 60);
        assert!(keys.issue(Uuid::new_v4()).is_ok());
    }

    #[test]
    fn expiry_past_the_calendar_is_an_error() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let end_of_time = time::PrimitiveDateTime::MAX.assume_utc();
        assert!(keys.issue_at(Uuid::new_v4(), end_of_time).is_err());
    }

    #[test]
    fn old_token_is_rejected_by_wall_clock() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let long_ago = OffsetDateTime::now_utc() - TimeDuration::hours(2);
        let token = keys.issue_at(Uuid::new_v4(), long_ago).unwrap();
        assert_eq!(keys.verify(&token), Err(VerificationError::Expired));
    }

    #[test]
    fn verify_rejects_other_secret() {
        let ours = make_keys("secret-a", "iss", "aud");
        let theirs = make_keys("secret-b", "iss", "aud");
        let token = theirs.issue(Uuid::new_v4()).unwrap();
        assert_eq!(ours.verify(&token), Err(VerificationError::InvalidSignature));
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good_keys = make_keys("same-secret", "good-iss", "good-aud");
        let bad_keys = make_keys("same-secret", "bad-iss", "bad-aud");
        let token = good_keys.issue(Uuid::new_v4()).unwrap();
        assert_eq!(
            bad_keys.verify(&token),
            Err(VerificationError::InvalidSignature)
        );
    }

    #[test]
    fn verify_rejects_tampered_payload() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let token = keys.issue(Uuid::new_v4()).unwrap();
        let other = keys.issue(Uuid::new_v4()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);
        assert_eq!(keys.verify(&spliced), Err(VerificationError::InvalidSignature));
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = make_keys("dev-secret", "iss", "aud");
        assert_eq!(keys.verify("not-a-jwt"), Err(VerificationError::Malformed));
        assert_eq!(keys.verify(""), Err(VerificationError::Malformed));
        assert_eq!(keys.verify("a.b.c"), Err(VerificationError::Malformed));
    }
}
