//! Credential store
//!
//! Account lookup, creation and password checks consumed by the token service.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use auth::Role;
use error::StoreError;

use crate::models::Account;
use crate::password;

/// Password shipped with the seeded demo accounts.
pub const DEMO_PASSWORD: &str = "password123";

/// Credential store trait for account operations.
///
/// `create_account` must check username uniqueness and insert atomically.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find an account by username
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError>;

    /// Find an account by id
    async fn find_by_id(&self, id: i64) -> Result<Option<Account>, StoreError>;

    /// Create a new account with role `user`
    async fn create_account(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<Account, StoreError>;

    /// Check a plaintext password against a stored hash
    async fn verify_password(&self, password: &str, password_hash: &str)
        -> Result<bool, StoreError>;
}

/// In-memory store for testing and development
pub struct InMemoryCredentialStore {
    accounts: RwLock<Vec<Account>>,
    next_id: AtomicI64,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// A store holding the `demo` (user) and `admin` (admin) accounts.
    pub fn with_demo_accounts() -> Result<Self, StoreError> {
        let store = Self::new();
        store.insert("demo", DEMO_PASSWORD, "demo@example.com", Role::User)?;
        store.insert("admin", DEMO_PASSWORD, "admin@example.com", Role::Admin)?;
        Ok(store)
    }

    /// Insert an account with an explicit role. Hashes on the calling
    /// thread, so use it for seeding, not from request handlers.
    pub fn insert(
        &self,
        username: &str,
        password: &str,
        email: &str,
        role: Role,
    ) -> Result<Account, StoreError> {
        let password_hash = password::hash_password(password)?;
        self.insert_hashed(username, password_hash, email, role)
    }

    fn insert_hashed(
        &self,
        username: &str,
        password_hash: String,
        email: &str,
        role: Role,
    ) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.write().map_err(|_| poisoned())?;
        if accounts.iter().any(|a| a.username == username) {
            return Err(StoreError::DuplicateUsername(username.to_string()));
        }

        let account = Account {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            username: username.to_string(),
            password_hash,
            email: email.to_string(),
            role,
        };
        accounts.push(account.clone());
        Ok(account)
    }

    pub fn len(&self) -> usize {
        self.accounts.read().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("account lock poisoned".to_string())
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().map_err(|_| poisoned())?;
        Ok(accounts.iter().find(|a| a.username == username).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().map_err(|_| poisoned())?;
        Ok(accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn create_account(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<Account, StoreError> {
        // Cheap early rejection before paying for the hash; `insert_hashed` re-checks under the write lock.
        if self.find_by_username(username).await?.is_some() {
            return Err(StoreError::DuplicateUsername(username.to_string()));
        }
        let password_hash = password::hash_password_blocking(password).await?;
        self.insert_hashed(username, password_hash, email, Role::User)
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        password::verify_password_blocking(password, password_hash).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_and_find() {
        let store = InMemoryCredentialStore::new();
        let created = store
            .create_account("alice", "s3cret!", "alice@example.com")
            .await
            .unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.role, Role::User);
        assert_ne!(created.password_hash, "s3cret!");

        let found = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found, created);
        assert_eq!(store.find_by_id(1).await.unwrap(), Some(created));
        assert!(store.find_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let store = InMemoryCredentialStore::new();
        store.create_account("alice", "a", "a@example.com").await.unwrap();

        let result = store.create_account("alice", "b", "b@example.com").await;
        assert!(matches!(result, Err(StoreError::DuplicateUsername(_))));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_registration_single_winner() {
        let store = Arc::new(InMemoryCredentialStore::new());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .create_account("racer", "pw", &format!("racer{}@example.com", i))
                        .await
                })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_demo_accounts() {
        let store = InMemoryCredentialStore::with_demo_accounts().unwrap();
        let demo = store.find_by_username("demo").await.unwrap().unwrap();
        let admin = store.find_by_username("admin").await.unwrap().unwrap();

        assert_eq!(demo.role, Role::User);
        assert_eq!(admin.role, Role::Admin);
        assert!(store
            .verify_password(DEMO_PASSWORD, &demo.password_hash)
            .await
            .unwrap());
        assert!(!store
            .verify_password("wrong", &admin.password_hash)
            .await
            .unwrap());
    }
}
