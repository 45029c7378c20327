//! Authentication types for JWT tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims for access tokens.
///
/// Tokens are issued by the identity service; this backend only validates
/// them and reads the caller's company context and permission set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Company ID (current tenant context).
    pub com: Uuid,
    /// Granted permissions, e.g. `"update:quality"` or `"view:settings"`.
    pub perms: Vec<String>,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(
        user_id: Uuid,
        company_id: Uuid,
        permissions: Vec<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            com: company_id,
            perms: permissions,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Returns the company ID from claims.
    #[must_use]
    pub const fn company_id(&self) -> Uuid {
        self.com
    }

    /// Returns true if the claims grant the given capability.
    #[must_use]
    pub fn has_permission(&self, capability: &str) -> bool {
        self.perms.iter().any(|p| p == capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_permission_lookup() {
        let claims = Claims::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec!["update:quality".to_string(), "view:settings".to_string()],
            Utc::now() + Duration::minutes(15),
        );
        assert!(claims.has_permission("update:quality"));
        assert!(claims.has_permission("view:settings"));
        assert!(!claims.has_permission("update:settings"));
    }

    #[test]
    fn test_claims_accessors() {
        let user = Uuid::new_v4();
        let company = Uuid::new_v4();
        let claims = Claims::new(user, company, vec![], Utc::now() + Duration::minutes(1));
        assert_eq!(claims.user_id(), user);
        assert_eq!(claims.company_id(), company);
    }
}
