//! Account models
//!
//! Accounts belong to the credential store. The token service only reads them.

use auth::{Principal, Role};
use serde::{Deserialize, Serialize};

/// A stored account, including its password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub role: Role,
}

impl Account {
    /// The identity a token for this account carries.
    pub fn principal(&self) -> Principal {
        Principal::new(self.id, self.username.clone(), self.email.clone(), self.role)
    }

    /// The account as it may be shown to clients.
    pub fn public(&self) -> PublicAccount {
        PublicAccount {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Account view without the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicAccount {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
}
