//! Token Service
//!
//! Issues signed session tokens for accounts in a credential store, gates
//! access on them, refreshes them and explains them.

pub mod models;
pub mod password;
pub mod repository;
pub mod service;

pub use models::{Account, PublicAccount};
pub use repository::{CredentialStore, InMemoryCredentialStore};
pub use service::{DiagnosticReport, IssuedToken, SignedToken, TokenInfo, TokenService};
