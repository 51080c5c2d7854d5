//! Signing secret and token lifetime configuration.

use std::fmt;

use error::ConfigError;
use hmac::{Hmac, Mac};
use sha2::Sha256;

pub(crate) type HmacSha256 = Hmac<Sha256>;

/// The process-wide signing secret.
///
/// Holds the prepared HMAC key rather than the raw bytes, so there is nothing
/// to read back out of it. `Debug` output is redacted.
#[derive(Clone)]
pub struct Secret {
    key: HmacSha256,
}

impl Secret {
    /// Prepare a signing secret. Empty and whitespace-only secrets are rejected.
    pub fn new(secret: &str) -> Result<Self, ConfigError> {
        if secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        let key = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| {
            tracing::error!("Failed to create HMAC key: {}", e);
            ConfigError::MissingSecret
        })?;
        Ok(Self { key })
    }

    pub(crate) fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut mac = self.key.clone();
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }

    /// Constant-time comparison of `signature` against the MAC of `data`.
    pub(crate) fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        let mut mac = self.key.clone();
        mac.update(data);
        mac.verify_slice(signature).is_ok()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Token configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: Secret,
    /// Token validity duration in seconds
    pub ttl_secs: i64,
    /// The validity duration as it was configured, e.g. `1h`
    pub expires_in: String,
}

impl JwtConfig {
    /// Create a new token configuration with a TTL in seconds.
    pub fn new(secret: &str, ttl_secs: i64) -> Result<Self, ConfigError> {
        if ttl_secs <= 0 {
            return Err(ConfigError::InvalidTtl(ttl_secs.to_string()));
        }
        Ok(Self {
            secret: Secret::new(secret)?,
            ttl_secs,
            expires_in: format!("{}s", ttl_secs),
        })
    }

    /// Create a configuration from a duration string such as `3600`, `15m` or `1h`.
    pub fn from_expires_in(secret: &str, expires_in: &str) -> Result<Self, ConfigError> {
        let ttl_secs = parse_ttl(expires_in)?;
        let mut config = Self::new(secret, ttl_secs)?;
        config.expires_in = expires_in.trim().to_string();
        Ok(config)
    }
}

/// Parse a token lifetime: plain seconds, or a number followed by `s`, `m`, `h` or `d`.
pub fn parse_ttl(value: &str) -> Result<i64, ConfigError> {
    let invalid = || ConfigError::InvalidTtl(value.to_string());
    let value = value.trim();

    let (digits, multiplier) = match value.char_indices().last() {
        Some((idx, 's')) => (&value[..idx], 1),
        Some((idx, 'm')) => (&value[..idx], 60),
        Some((idx, 'h')) => (&value[..idx], 60 * 60),
        Some((idx, 'd')) => (&value[..idx], 24 * 60 * 60),
        Some(_) => (value, 1),
        None => return Err(invalid()),
    };

    let amount: i64 = digits.trim().parse().map_err(|_| invalid())?;
    match amount.checked_mul(multiplier) {
        Some(secs) if secs > 0 => Ok(secs),
        _ => Err(invalid()),
    }
}
