//! Token service
//!
//! Issues tokens for authenticated accounts, gates access on them, refreshes
//! them and produces diagnostic reports. Holds one immutable signing
//! configuration shared by every request.

use std::sync::Arc;

use auth::{ClaimSet, Clock, JwtConfig, Principal, SystemClock};
use error::{AuthError, TokenError};
use serde::Serialize;

use crate::models::PublicAccount;
use crate::password;
use crate::repository::CredentialStore;

/// A freshly signed token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub claims: ClaimSet,
}

/// Unverified decode of an issued token, returned alongside it on login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub header: serde_json::Value,
    pub payload: serde_json::Value,
    pub expires_in: String,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: SignedToken,
    pub account: PublicAccount,
    pub token_info: TokenInfo,
}

/// Structural decode plus verification verdict for any presented token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    pub header: Option<serde_json::Value>,
    pub payload: Option<serde_json::Value>,
    pub signature: Option<String>,
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DiagnosticReport {
    /// Whether the token could be split into a header and payload at all.
    pub fn is_decodable(&self) -> bool {
        self.header.is_some() && self.payload.is_some()
    }
}

/// Token service for authentication operations
pub struct TokenService {
    config: JwtConfig,
    store: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Create a new token service using the system clock
    pub fn new(config: JwtConfig, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            config,
            store,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The configured token lifetime, as configured
    pub fn expires_in(&self) -> &str {
        &self.config.expires_in
    }

    /// Authenticate `username` and issue a token for the account.
    ///
    /// Unknown usernames and wrong passwords both yield `InvalidCredentials`.
    pub async fn issue(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError> {
        require("username", username)?;
        require("password", password)?;

        let account = self.store.find_by_username(username).await.map_err(|e| {
            tracing::error!("Credential store lookup failed: {}", e);
            AuthError::from(e)
        })?;

        let account = match account {
            Some(account) => {
                if !self.check_password(password, &account.password_hash).await? {
                    tracing::info!(username, "Login rejected: wrong password");
                    return Err(AuthError::InvalidCredentials);
                }
                account
            }
            None => {
                let dummy = password::dummy_hash().map_err(|e| {
                    tracing::error!("Failed to prepare dummy password hash: {}", e);
                    AuthError::from(e)
                })?;
                self.check_password(password, dummy).await?;
                tracing::info!(username, "Login rejected: unknown username");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let token = self.sign(&account.principal(), self.clock.now())?;
        let decoded = auth::decode_unverified(&token.token).map_err(|e| {
            tracing::error!("Freshly issued token failed to decode: {}", e);
            AuthError::TokenCreationFailed
        })?;

        tracing::info!(
            subject_id = account.id,
            username = %account.username,
            expires_at = token.claims.expires_at,
            "Issued token"
        );

        Ok(IssuedToken {
            token,
            account: account.public(),
            token_info: TokenInfo {
                header: decoded.header,
                payload: decoded.payload,
                expires_in: self.config.expires_in.clone(),
            },
        })
    }

    /// Gate check: verify a presented token and return its claims.
    ///
    /// Every failure is reported as `Unauthorized`; the specific reason is
    /// only logged.
    pub fn authorize(&self, token: &str) -> Result<ClaimSet, AuthError> {
        auth::verify_at(token, &self.config.secret, self.clock.now()).map_err(|e| {
            tracing::warn!(reason = e.reason(), "Rejected token: {}", e);
            AuthError::Unauthorized
        })
    }

    /// Issue a new token carrying the same identity as `current`.
    ///
    /// `current` must come from a successful [`authorize`](Self::authorize).
    /// The credential store is not consulted. The new `iat` is the current
    /// time, bumped past the old `iat` when both fall in the same second but
    /// never more than one second ahead of the clock, so `exp` stays within
    /// one second of `now + ttl` however often a token is refreshed.
    pub fn refresh(&self, current: &ClaimSet) -> Result<SignedToken, AuthError> {
        let now = self.clock.now();
        let issued_at = now
            .max(current.issued_at.saturating_add(1))
            .min(now.saturating_add(1));
        let token = self.sign(&current.principal(), issued_at)?;

        tracing::info!(
            subject_id = current.subject_id,
            previous_iat = current.issued_at,
            expires_at = token.claims.expires_at,
            "Refreshed token"
        );
        Ok(token)
    }

    /// Decode a token for inspection and report whether it verifies.
    ///
    /// Never use the report to grant access.
    pub fn diagnose(&self, token: &str) -> DiagnosticReport {
        let signature = token.split('.').nth(2).map(str::to_string);
        let (header, payload) = match auth::decode_unverified(token) {
            Ok(decoded) => (Some(decoded.header), Some(decoded.payload)),
            Err(_) => (None, None),
        };

        let verdict = auth::verify_at(token, &self.config.secret, self.clock.now());
        tracing::debug!(valid = verdict.is_ok(), "Diagnosed token");

        match verdict {
            Ok(_) => DiagnosticReport {
                header,
                payload,
                signature,
                is_valid: true,
                reason: None,
                error: None,
            },
            Err(e) => DiagnosticReport {
                header,
                payload,
                signature,
                is_valid: false,
                reason: Some(e.reason()),
                error: Some(e.to_string()),
            },
        }
    }

    /// Create a new account with role `user`.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<PublicAccount, AuthError> {
        require("username", username)?;
        require("password", password)?;
        require("email", email)?;

        let account = self
            .store
            .create_account(username, password, email)
            .await
            .map_err(|e| {
                tracing::warn!("Registration failed: {}", e);
                AuthError::from(e)
            })?;

        tracing::info!(subject_id = account.id, username = %account.username, "Registered account");
        Ok(account.public())
    }

    /// Current public view of the account a token was issued for.
    pub async fn profile(&self, claims: &ClaimSet) -> Result<PublicAccount, AuthError> {
        self.store
            .find_by_id(claims.subject_id)
            .await
            .map_err(|e| {
                tracing::error!("Credential store lookup failed: {}", e);
                AuthError::from(e)
            })?
            .map(|account| account.public())
            .ok_or(AuthError::NotFound)
    }

    async fn check_password(&self, password: &str, password_hash: &str) -> Result<bool, AuthError> {
        self.store
            .verify_password(password, password_hash)
            .await
            .map_err(|e| {
                tracing::error!("Password verification failed: {}", e);
                AuthError::from(e)
            })
    }

    fn sign(&self, principal: &Principal, issued_at: i64) -> Result<SignedToken, AuthError> {
        let claims = ClaimSet::issue(principal, issued_at, self.config.ttl_secs);
        let token = auth::encode_claims(&claims, &self.config.secret).map_err(|e: TokenError| {
            tracing::error!("Failed to encode token: {}", e);
            AuthError::TokenCreationFailed
        })?;
        Ok(SignedToken { token, claims })
    }
}

fn require(field: &'static str, value: &str) -> Result<(), AuthError> {
    if value.is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(())
}
