//! Signed session tokens.
//!
//! This crate provides the claim set carried by a token, the signing secret
//! and lifetime configuration, and the codec that encodes, decodes and
//! verifies HMAC-SHA256 signed tokens.

mod claims;
mod clock;
mod config;
mod jwt;

pub use claims::{ClaimSet, Principal, Role};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{parse_ttl, JwtConfig, Secret};
pub use jwt::{
    decode_unverified, encode, encode_at, encode_claims, verify, verify_at, DecodedToken, Header, ALGORITHM,
    TOKEN_TYPE,
};
