//! Token claims and role definitions.

use serde::{Deserialize, Serialize};

/// User roles in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular user
    User,
    /// Administrator with full access
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Self::User
    }
}

/// The identity part of a token, without any timing information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub subject_id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl Principal {
    pub fn new(
        subject_id: i64,
        username: impl Into<String>,
        email: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            subject_id,
            username: username.into(),
            email: email.into(),
            role,
        }
    }
}

/// Token claims structure.
///
/// Field order is the order of the keys in the serialized payload:
/// `id`, `username`, `email`, `role`, `iat`, `exp`. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClaimSet {
    /// Subject (account ID)
    #[serde(rename = "id")]
    pub subject_id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    /// Issued at (Unix timestamp)
    #[serde(rename = "iat")]
    pub issued_at: i64,
    /// Expiration time (Unix timestamp)
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl ClaimSet {
    /// Build the claims for `principal`, valid from `issued_at` for `ttl_secs`.
    pub fn issue(principal: &Principal, issued_at: i64, ttl_secs: i64) -> Self {
        Self {
            subject_id: principal.subject_id,
            username: principal.username.clone(),
            email: principal.email.clone(),
            role: principal.role,
            issued_at,
            expires_at: issued_at.saturating_add(ttl_secs),
        }
    }

    /// The identity carried by these claims.
    pub fn principal(&self) -> Principal {
        Principal {
            subject_id: self.subject_id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }

    /// A token stops being valid at the exact second of `exp`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    /// Check if the user has admin role.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_key_order() {
        let principal = Principal::new(1, "demo", "demo@example.com", Role::User);
        let claims = ClaimSet::issue(&principal, 1_700_000_000, 3600);
        let json = serde_json::to_string(&claims).unwrap();
        assert_eq!(
            json,
            r#"{"id":1,"username":"demo","email":"demo@example.com","role":"user","iat":1700000000,"exp":1700003600}"#
        );
    }

    #[test]
    fn test_expiry_boundary() {
        let principal = Principal::new(2, "admin", "admin@example.com", Role::Admin);
        let claims = ClaimSet::issue(&principal, 100, 10);
        assert!(!claims.is_expired_at(109));
        assert!(claims.is_expired_at(110));
        assert!(claims.is_admin());
        assert_eq!(claims.principal(), principal);
    }

    #[test]
    fn test_extra_claims_rejected() {
        let json = r#"{"id":1,"username":"a","email":"b","role":"user","iat":1,"exp":2,"admin":true}"#;
        assert!(serde_json::from_str::<ClaimSet>(json).is_err());
    }
}
