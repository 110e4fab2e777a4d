//! Session guard
//!
//! The client never verifies token signatures (the backend does). It only
//! reads the claims it needs: `sub` for the caller's identity and `exp` to
//! refuse sessions that are already over. Anything that cannot be decoded
//! is handled as an expired session.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::error::SessionError;
use crate::token_store::TokenStore;

/// Claims read from the access token
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    exp: i64,
}

/// The authenticated caller, as carried by the token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Identity {
    /// Whether the token is past its expiry at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Decode the identity carried by a token without checking its signature
/// or expiry
pub fn decode_identity(token: &str) -> Result<Identity, SessionError> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::from(["exp".to_string()]);

    let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|_| SessionError::Malformed)?;

    let expires_at =
        DateTime::from_timestamp(data.claims.exp, 0).ok_or(SessionError::Malformed)?;

    Ok(Identity {
        user_id: data.claims.sub,
        email: data.claims.email,
        expires_at,
    })
}

/// Refuses stored sessions that are absent, malformed or expired
#[derive(Debug, Clone)]
pub struct SessionGuard {
    store: Arc<dyn TokenStore>,
}

impl SessionGuard {
    /// Create a guard over the given store
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Check the stored session against the current time
    pub fn check(&self) -> Result<Identity, SessionError> {
        self.check_at(Utc::now())
    }

    /// Check the stored session against `now`
    ///
    /// A refused token is removed from the store.
    pub fn check_at(&self, now: DateTime<Utc>) -> Result<Identity, SessionError> {
        let token = self.store.get().ok_or(SessionError::Missing)?;

        let refusal = match decode_identity(&token) {
            Ok(identity) if !identity.is_expired_at(now) => return Ok(identity),
            Ok(identity) => {
                info!(
                    "Session for {} expired at {}",
                    identity.user_id, identity.expires_at
                );
                SessionError::Expired
            }
            Err(e) => {
                warn!("Stored session token could not be decoded");
                e
            }
        };

        if let Err(e) = self.store.remove() {
            error!("Failed to clear refused session token: {}", e);
        }
        Err(refusal)
    }

    /// Identity of the stored token without clearing anything
    ///
    /// Returns `None` when no token is stored or it cannot be decoded;
    /// expiry is not checked.
    pub fn current_identity(&self) -> Option<Identity> {
        self.store
            .get()
            .and_then(|token| decode_identity(&token).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_store::MemoryTokenStore;
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    fn token_expiring_at(exp: i64) -> String {
        let claims = json!({ "sub": "user-1", "email": "ana@example.com", "exp": exp });
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"server-secret"),
        )
        .unwrap()
    }

    fn guard_with(token: Option<&str>) -> (SessionGuard, Arc<MemoryTokenStore>) {
        let store = Arc::new(MemoryTokenStore::new());
        if let Some(token) = token {
            store.set(token).unwrap();
        }
        (SessionGuard::new(store.clone()), store)
    }

    #[test]
    fn test_valid_token_yields_identity() {
        let now = Utc::now();
        let token = token_expiring_at((now + Duration::hours(1)).timestamp());
        let (guard, store) = guard_with(Some(&token));

        let identity = guard.check_at(now).unwrap();
        assert_eq!(identity.user_id, "user-1");
        assert_eq!(identity.email.as_deref(), Some("ana@example.com"));
        assert!(store.get().is_some());
    }

    #[test]
    fn test_expired_token_is_cleared() {
        let now = Utc::now();
        let token = token_expiring_at((now - Duration::minutes(1)).timestamp());
        let (guard, store) = guard_with(Some(&token));

        assert_eq!(guard.check_at(now), Err(SessionError::Expired));
        assert_eq!(store.get(), None);
    }

    #[test]
    fn test_expiry_boundary_is_expired() {
        let now = Utc::now();
        let token = token_expiring_at(now.timestamp());
        let (guard, _) = guard_with(Some(&token));

        let at_expiry = DateTime::from_timestamp(now.timestamp(), 0).unwrap();
        assert_eq!(guard.check_at(at_expiry), Err(SessionError::Expired));
    }

    #[test]
    fn test_malformed_token_fails_closed() {
        let (guard, store) = guard_with(Some("not-a-jwt"));

        assert_eq!(guard.check(), Err(SessionError::Malformed));
        assert_eq!(store.get(), None);
    }

    #[test]
    fn test_token_without_exp_is_malformed() {
        let token = encode(
            &Header::default(),
            &json!({ "sub": "user-1" }),
            &EncodingKey::from_secret(b"k"),
        )
        .unwrap();
        let (guard, _) = guard_with(Some(&token));

        assert_eq!(guard.check(), Err(SessionError::Malformed));
    }

    #[test]
    fn test_missing_token() {
        let (guard, _) = guard_with(None);
        assert_eq!(guard.check(), Err(SessionError::Missing));
        assert_eq!(guard.current_identity(), None);
    }

    #[test]
    fn test_current_identity_does_not_clear() {
        let token = token_expiring_at((Utc::now() - Duration::days(1)).timestamp());
        let (guard, store) = guard_with(Some(&token));

        let identity = guard.current_identity().unwrap();
        assert!(identity.is_expired_at(Utc::now()));
        assert!(store.get().is_some());

        store.set("garbage").unwrap();
        assert_eq!(guard.current_identity(), None);
        assert!(store.get().is_some());
    }
}
