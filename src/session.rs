//! The three-token bundle (spec §3/§4.5: "Session"). Tokens are opaque
//! bearer blobs to the core — we read only the unvalidated `exp` claim out
//! of the JWT payload to decide freshness; signature verification belongs
//! to a collaborator outside this crate's scope.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An opaque bearer token (id, access, or refresh). Equality and cloning
/// are by raw string; `expires_at` is derived lazily from the JWT's `exp`
/// claim, so refresh tokens (not JWTs) simply never expire by this clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token(String);

#[derive(Deserialize)]
struct JwtPayload {
    exp: Option<i64>,
}

impl Token {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The token's `exp` claim, if it parses as a JWT carrying one.
    /// No signature check is performed (Non-goal: "does not validate JWT
    /// signatures — it trusts the server channel").
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let payload_segment = self.0.split('.').nth(1)?;
        let decoded = URL_SAFE_NO_PAD.decode(payload_segment).ok()?;
        let payload: JwtPayload = serde_json::from_slice(&decoded).ok()?;
        let exp = payload.exp?;
        DateTime::from_timestamp(exp, 0)
    }

    /// True if the token carries no `exp` claim, or its `exp` is in the
    /// future. Opaque non-JWT tokens (refresh tokens) are always "fresh".
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at() {
            Some(exp) => exp > now,
            None => true,
        }
    }
}

impl From<String> for Token {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id_token: Token,
    pub access_token: Token,
    pub refresh_token: Token,
}

impl Session {
    pub fn new(id_token: Token, access_token: Token, refresh_token: Token) -> Self {
        Self { id_token, access_token, refresh_token }
    }

    /// True iff the id and access tokens are both present and unexpired.
    /// The sole gatekeeper for any authenticated operation (spec §3
    /// invariant).
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.id_token.is_fresh(now) && self.access_token.is_fresh(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use chrono::TimeZone;

    fn jwt_with_exp(exp: i64) -> Token {
        let header = URL_SAFE_NO_PAD.encode(b"{}");
        let payload = URL_SAFE_NO_PAD.encode(format!("{{\"exp\":{exp}}}"));
        Token::new(format!("{header}.{payload}.sig"))
    }

    #[test]
    fn opaque_token_is_always_fresh() {
        let token = Token::new("rf.jwt");
        assert!(token.is_fresh(Utc::now()));
        assert_eq!(token.expires_at(), None);
    }

    #[test]
    fn expired_jwt_is_not_fresh() {
        let now = Utc.with_ymd_and_hms(2024, 4, 9, 7, 4, 32).unwrap();
        let past = jwt_with_exp(now.timestamp() - 3600);
        assert!(!past.is_fresh(now));
    }

    #[test]
    fn future_jwt_is_fresh() {
        let now = Utc.with_ymd_and_hms(2024, 4, 9, 7, 4, 32).unwrap();
        let future = jwt_with_exp(now.timestamp() + 3600);
        assert!(future.is_fresh(now));
    }

    #[test]
    fn session_is_valid_iff_both_jwts_fresh() {
        let now = Utc.with_ymd_and_hms(2024, 4, 9, 7, 4, 32).unwrap();
        let fresh = jwt_with_exp(now.timestamp() + 3600);
        let expired = jwt_with_exp(now.timestamp() - 3600);

        let valid = Session::new(fresh.clone(), fresh.clone(), Token::new("rf.jwt"));
        assert!(valid.is_valid(now));

        let invalid = Session::new(fresh, expired, Token::new("rf.jwt"));
        assert!(!invalid.is_valid(now));
    }
}
