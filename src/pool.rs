//! Immutable per-pool configuration (spec §3: "Pool").

use crate::error::{AuthError, Result};

/// Default RNG strength for SRP blinding (spec §9: "Paranoia parameter").
pub const DEFAULT_PARANOIA: u8 = 7;

/// Acceptable range for the paranoia parameter, inclusive.
pub const MAX_PARANOIA: u8 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    user_pool_id: String,
    client_id: String,
    paranoia: u8,
}

impl Pool {
    /// `user_pool_id` is of the form `<region>_<suffix>`; the suffix is
    /// used as the SRP realm identifier for user-SRP (spec §3).
    pub fn new(user_pool_id: impl Into<String>, client_id: impl Into<String>) -> Result<Self> {
        Self::with_paranoia(user_pool_id, client_id, DEFAULT_PARANOIA)
    }

    pub fn with_paranoia(
        user_pool_id: impl Into<String>,
        client_id: impl Into<String>,
        paranoia: u8,
    ) -> Result<Self> {
        let user_pool_id = user_pool_id.into();
        let client_id = client_id.into();

        if user_pool_id.is_empty() {
            return Err(AuthError::invalid_argument("user_pool_id must not be empty"));
        }
        if client_id.is_empty() {
            return Err(AuthError::invalid_argument("client_id must not be empty"));
        }
        if paranoia > MAX_PARANOIA {
            return Err(AuthError::invalid_argument(format!(
                "paranoia must be in 0..={MAX_PARANOIA}, got {paranoia}"
            )));
        }

        Ok(Self { user_pool_id, client_id, paranoia })
    }

    pub fn user_pool_id(&self) -> &str {
        &self.user_pool_id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn paranoia(&self) -> u8 {
        self.paranoia
    }

    /// The SRP realm identifier for user-SRP: the part of `user_pool_id`
    /// after the region prefix (`<region>_<suffix>`).
    pub fn realm_id(&self) -> &str {
        self.user_pool_id.split('_').next_back().unwrap_or(&self.user_pool_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn realm_id_strips_region_prefix() {
        let pool = Pool::new("us-east-1_AbCdEfGhI", "client123").unwrap();
        assert_eq!(pool.realm_id(), "AbCdEfGhI");
    }

    #[test]
    fn rejects_paranoia_out_of_range() {
        let err = Pool::with_paranoia("us-east-1_x", "client123", 11).unwrap_err();
        assert!(matches!(err, AuthError::InvalidArgument { .. }));
    }

    #[test]
    fn rejects_empty_ids() {
        assert!(Pool::new("", "client123").is_err());
        assert!(Pool::new("us-east-1_x", "").is_err());
    }

    #[test]
    fn default_paranoia_is_seven() {
        let pool = Pool::new("us-east-1_x", "client123").unwrap();
        assert_eq!(pool.paranoia(), DEFAULT_PARANOIA);
    }
}
