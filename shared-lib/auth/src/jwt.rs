//! Token encoding, decoding and verification.
//!
//! Wire format: `base64url(header) "." base64url(payload) "." base64url(signature)`,
//! unpadded, where the signature is HMAC-SHA256 over the first two segments
//! exactly as transmitted.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use error::TokenError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::claims::{ClaimSet, Principal};
use crate::config::Secret;

/// Algorithm identifier written into every header.
pub const ALGORITHM: &str = "HS256";
/// Token type written into every header.
pub const TOKEN_TYPE: &str = "JWT";

/// Token header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub alg: String,
    pub typ: String,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            alg: ALGORITHM.to_string(),
            typ: TOKEN_TYPE.to_string(),
        }
    }
}

/// Structural view of a token, obtained without checking its signature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedToken {
    pub header: serde_json::Value,
    pub payload: serde_json::Value,
    /// The signature segment as transmitted.
    pub signature: String,
}

/// Encode a token for `principal` using the system clock.
pub fn encode(principal: &Principal, secret: &Secret, ttl_secs: i64) -> Result<String, TokenError> {
    encode_at(principal, secret, ttl_secs, chrono::Utc::now().timestamp())
}

/// Encode a token for `principal` issued at `now`.
///
/// The TTL is not validated here, so a negative TTL yields a token that is
/// already expired.
pub fn encode_at(
    principal: &Principal,
    secret: &Secret,
    ttl_secs: i64,
    now: i64,
) -> Result<String, TokenError> {
    encode_claims(&ClaimSet::issue(principal, now, ttl_secs), secret)
}

/// Sign an already built claim set.
pub fn encode_claims(claims: &ClaimSet, secret: &Secret) -> Result<String, TokenError> {
    let header = encode_segment(&Header::default())?;
    let payload = encode_segment(claims)?;
    let signing_input = format!("{}.{}", header, payload);
    let signature = URL_SAFE_NO_PAD.encode(secret.sign(signing_input.as_bytes()));

    Ok(format!("{}.{}", signing_input, signature))
}

/// Split a token into its header and payload JSON without verifying it.
///
/// Never use the result to grant access.
pub fn decode_unverified(token: &str) -> Result<DecodedToken, TokenError> {
    let (header, payload, signature) = split_segments(token)?;

    let header_json: serde_json::Value = decode_segment(header, "header")?;
    let payload_json: serde_json::Value = decode_segment(payload, "payload")?;
    if !header_json.is_object() || !payload_json.is_object() {
        return Err(TokenError::Malformed("segment is not a JSON object".into()));
    }
    decode_signature(signature)?;

    Ok(DecodedToken {
        header: header_json,
        payload: payload_json,
        signature: signature.to_string(),
    })
}

/// Verify a token using the system clock.
pub fn verify(token: &str, secret: &Secret) -> Result<ClaimSet, TokenError> {
    verify_at(token, secret, chrono::Utc::now().timestamp())
}

/// Verify a token's signature, then its expiry at `now`.
///
/// The signature is checked over the raw segment bytes before anything in
/// the header or payload is parsed.
pub fn verify_at(token: &str, secret: &Secret, now: i64) -> Result<ClaimSet, TokenError> {
    let (header, payload, signature) = split_segments(token)?;
    let signature = decode_signature(signature)?;

    let signing_input = &token[..header.len() + 1 + payload.len()];
    if !secret.verify(signing_input.as_bytes(), &signature) {
        return Err(TokenError::SignatureInvalid);
    }

    let header: Header = decode_segment(header, "header")?;
    if header.alg != ALGORITHM {
        return Err(TokenError::Malformed(format!(
            "unsupported algorithm {}",
            header.alg
        )));
    }

    let claims: ClaimSet = decode_segment(payload, "payload")?;
    if claims.is_expired_at(now) {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

fn split_segments(token: &str) -> Result<(&str, &str, &str), TokenError> {
    let mut segments = token.split('.');
    match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(header), Some(payload), Some(signature), None) => Ok((header, payload, signature)),
        _ => Err(TokenError::Malformed(format!(
            "expected 3 segments, found {}",
            token.split('.').count()
        ))),
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value).map_err(|e| {
        tracing::error!("Failed to serialize token segment: {}", e);
        TokenError::CreationFailed(e.to_string())
    })?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: DeserializeOwned>(segment: &str, name: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| TokenError::Malformed(format!("{} segment: {}", name, e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| TokenError::Malformed(format!("{} segment: {}", name, e)))
}

fn decode_signature(segment: &str) -> Result<Vec<u8>, TokenError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| TokenError::Malformed(format!("signature segment: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::Role;

    const NOW: i64 = 1_700_000_000;

    fn demo() -> Principal {
        Principal::new(1, "demo", "demo@example.com", Role::User)
    }

    fn secret(value: &str) -> Secret {
        Secret::new(value).unwrap()
    }

    /// Replace the character at `idx` with a different base64url character.
    fn flip_char(token: &str, idx: usize) -> String {
        let mut bytes = token.as_bytes().to_vec();
        bytes[idx] = if bytes[idx] == b'A' { b'B' } else { b'A' };
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_encode_verify_round_trip() {
        let key = secret("test-secret-key");
        let token = encode_at(&demo(), &key, 3600, NOW).unwrap();

        let claims = verify_at(&token, &key, NOW + 1).unwrap();
        assert_eq!(claims.principal(), demo());
        assert_eq!(claims.issued_at, NOW);
        assert_eq!(claims.expires_at, NOW + 3600);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let key = secret("test-secret-key");
        let a = encode_at(&demo(), &key, 60, NOW).unwrap();
        let b = encode_at(&demo(), &key, 60, NOW).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.split('.').count(), 3);
    }

    #[test]
    fn test_header_segment() {
        let token = encode_at(&demo(), &secret("k"), 60, NOW).unwrap();
        let decoded = decode_unverified(&token).unwrap();
        assert_eq!(decoded.header, serde_json::json!({"alg": "HS256", "typ": "JWT"}));
        assert_eq!(decoded.payload["username"], "demo");
        assert_eq!(decoded.payload["role"], "user");
        assert_eq!(decoded.payload["iat"], NOW);
        assert_eq!(decoded.signature, token.rsplit('.').next().unwrap());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let key = secret("test-secret-key");
        let token = encode_at(&demo(), &key, 3600, NOW).unwrap();
        let header_len = token.find('.').unwrap();
        let payload_len = token[header_len + 1..].find('.').unwrap();

        for idx in header_len + 1..header_len + 1 + payload_len {
            let tampered = flip_char(&token, idx);
            assert_eq!(
                verify_at(&tampered, &key, NOW),
                Err(TokenError::SignatureInvalid),
                "payload byte {} accepted",
                idx
            );
        }
    }

    #[test]
    fn test_tampered_header_rejected() {
        let key = secret("test-secret-key");
        let token = encode_at(&demo(), &key, 3600, NOW).unwrap();
        let header_len = token.find('.').unwrap();

        for idx in 0..header_len {
            let tampered = flip_char(&token, idx);
            assert_eq!(verify_at(&tampered, &key, NOW), Err(TokenError::SignatureInvalid));
        }
    }

    #[test]
    fn test_forged_role_rejected() {
        let key = secret("test-secret-key");
        let token = encode_at(&demo(), &key, 3600, NOW).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let mut payload = decode_unverified(&token).unwrap().payload;
        payload["role"] = serde_json::json!("admin");
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap());
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert_eq!(verify_at(&forged, &key, NOW), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let secrets = ["alpha", "beta", "gamma-longer-secret", "δ-unicode"];
        for a in &secrets {
            let token = encode_at(&demo(), &secret(a), 3600, NOW).unwrap();
            for b in secrets.iter().filter(|b| *b != a) {
                assert_eq!(
                    verify_at(&token, &secret(b), NOW),
                    Err(TokenError::SignatureInvalid)
                );
            }
        }
    }

    #[test]
    fn test_expired_token() {
        let key = secret("test-secret-key");
        let token = encode_at(&demo(), &key, -1, NOW).unwrap();
        assert_eq!(verify_at(&token, &key, NOW), Err(TokenError::Expired));

        let expired_now = encode(&demo(), &key, -1).unwrap();
        assert_eq!(verify(&expired_now, &key), Err(TokenError::Expired));
    }

    #[test]
    fn test_valid_until_last_second() {
        let key = secret("test-secret-key");
        let ttl = 30 * 24 * 3600;
        let token = encode_at(&demo(), &key, ttl, NOW).unwrap();
        assert!(verify_at(&token, &key, NOW + ttl - 1).is_ok());
        assert_eq!(verify_at(&token, &key, NOW + ttl), Err(TokenError::Expired));
    }

    #[test]
    fn test_expired_forgery_reports_signature() {
        let token = encode_at(&demo(), &secret("other"), -100, NOW).unwrap();
        assert_eq!(
            verify_at(&token, &secret("test-secret-key"), NOW),
            Err(TokenError::SignatureInvalid)
        );
    }

    #[test]
    fn test_malformed_tokens() {
        let key = secret("k");
        for token in ["", "abc", "a.b", "a.b.c.d", "!!!.???.***"] {
            assert!(matches!(decode_unverified(token), Err(TokenError::Malformed(_))), "{}", token);
        }
        assert!(matches!(verify_at("a.b", &key, NOW), Err(TokenError::Malformed(_))));
        assert!(matches!(verify_at("a.b.c.d", &key, NOW), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_decode_ignores_signature_validity() {
        let token = encode_at(&demo(), &secret("one"), -1, NOW).unwrap();
        let decoded = decode_unverified(&token).unwrap();
        assert_eq!(decoded.payload["email"], "demo@example.com");
    }
}
