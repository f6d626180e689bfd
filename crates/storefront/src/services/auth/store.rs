//! Account persistence seam.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::RwLock;

use bazaar_core::{AddressId, Email, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::address::{Address, AddressInput};
use crate::models::user::User;

/// Persistence for accounts, their password hashes, and saved addresses.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Get a user by ID.
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Create a user with a password hash. Duplicate emails fail with
    /// `RepositoryError::Conflict`.
    async fn create_with_password(
        &self,
        email: &Email,
        name: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError>;

    /// Get a user and their password hash by email.
    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Get a user and their password hash by ID.
    async fn get_password_hash_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Replace a user's profile fields. `None` if the user is gone; a taken
    /// email fails with `RepositoryError::Conflict`.
    async fn update_profile(
        &self,
        id: UserId,
        email: &Email,
        name: &str,
        phone_number: Option<&str>,
    ) -> Result<Option<User>, RepositoryError>;

    /// Store a new password hash. `false` if the user is gone.
    async fn set_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<bool, RepositoryError>;

    /// A user's saved addresses, oldest first.
    async fn list_addresses(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError>;

    /// Save a new address. A second address of the same type fails with
    /// `RepositoryError::Conflict`.
    async fn insert_address(
        &self,
        user_id: UserId,
        address: &AddressInput,
    ) -> Result<Address, RepositoryError>;

    /// Replace a saved address. `None` if the user has no such address.
    async fn update_address(
        &self,
        user_id: UserId,
        id: AddressId,
        address: &AddressInput,
    ) -> Result<Option<Address>, RepositoryError>;

    /// Delete a saved address. `false` if the user has no such address.
    async fn delete_address(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<bool, RepositoryError>;
}

/// [`UserStore`] over `storefront.user`.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a store over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        UserRepository::new(&self.pool).get_by_id(id).await
    }

    async fn create_with_password(
        &self,
        email: &Email,
        name: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        UserRepository::new(&self.pool)
            .create_with_password(email, name, password_hash)
            .await
    }

    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        UserRepository::new(&self.pool).get_password_hash(email).await
    }

    async fn get_password_hash_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        UserRepository::new(&self.pool).get_password_hash_by_id(id).await
    }

    async fn update_profile(
        &self,
        id: UserId,
        email: &Email,
        name: &str,
        phone_number: Option<&str>,
    ) -> Result<Option<User>, RepositoryError> {
        UserRepository::new(&self.pool)
            .update_profile(id, email, name, phone_number)
            .await
    }

    async fn set_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<bool, RepositoryError> {
        UserRepository::new(&self.pool)
            .set_password_hash(id, password_hash)
            .await
    }

    async fn list_addresses(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        UserRepository::new(&self.pool).list_addresses(user_id).await
    }

    async fn insert_address(
        &self,
        user_id: UserId,
        address: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        UserRepository::new(&self.pool)
            .insert_address(user_id, address)
            .await
    }

    async fn update_address(
        &self,
        user_id: UserId,
        id: AddressId,
        address: &AddressInput,
    ) -> Result<Option<Address>, RepositoryError> {
        UserRepository::new(&self.pool)
            .update_address(user_id, id, address)
            .await
    }

    async fn delete_address(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<bool, RepositoryError> {
        UserRepository::new(&self.pool)
            .delete_address(user_id, id)
            .await
    }
}

/// [`UserStore`] held in memory, for tests and local runs.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<UserId, (User, String)>>,
    addresses: RwLock<HashMap<UserId, Vec<Address>>>,
    next_id: AtomicI32,
    next_address_id: AtomicI32,
}

impl MemoryUserStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a user, as an operator would.
    pub async fn remove(&self, id: UserId) -> bool {
        self.addresses.write().await.remove(&id);
        self.users.write().await.remove(&id).is_some()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().await.get(&id).map(|(user, _)| user.clone()))
    }

    async fn create_with_password(
        &self,
        email: &Email,
        name: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;
        if users.values().any(|(user, _)| &user.email == email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1),
            email: email.clone(),
            name: name.to_owned(),
            phone_number: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, (user.clone(), password_hash.to_owned()));
        drop(users);

        Ok(user)
    }

    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|(user, _)| &user.email == email)
            .cloned())
    }
    async fn get_password_hash_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn update_profile(
        &self,
        id: UserId,
        email: &Email,
        name: &str,
        phone_number: Option<&str>,
    ) -> Result<Option<User>, RepositoryError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|(user, _)| user.id != id && &user.email == email)
        {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let Some((user, _)) = users.get_mut(&id) else {
            return Ok(None);
        };
        user.email = email.clone();
        user.name = name.to_owned();
        user.phone_number = phone_number.map(str::to_owned);
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn set_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<bool, RepositoryError> {
        let mut users = self.users.write().await;
        let Some((user, hash)) = users.get_mut(&id) else {
            return Ok(false);
        };
        password_hash.clone_into(hash);
        user.updated_at = Utc::now();

        Ok(true)
    }

    async fn list_addresses(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        Ok(self
            .addresses
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn insert_address(
        &self,
        user_id: UserId,
        address: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut addresses = self.addresses.write().await;
        let saved = addresses.entry(user_id).or_default();
        if saved
            .iter()
            .any(|a| a.address_type == address.address_type)
        {
            return Err(RepositoryError::Conflict(
                "address type already exists".to_owned(),
            ));
        }

        let id = AddressId::new(self.next_address_id.fetch_add(1, Ordering::SeqCst) + 1);
        let address = address.clone().into_address(id);
        saved.push(address.clone());

        Ok(address)
    }

    async fn update_address(
        &self,
        user_id: UserId,
        id: AddressId,
        address: &AddressInput,
    ) -> Result<Option<Address>, RepositoryError> {
        let mut addresses = self.addresses.write().await;
        let Some(saved) = addresses.get_mut(&user_id) else {
            return Ok(None);
        };
        if !saved.iter().any(|a| a.id == id) {
            return Ok(None);
        }
        if saved
            .iter()
            .any(|a| a.id != id && a.address_type == address.address_type)
        {
            return Err(RepositoryError::Conflict(
                "address type already exists".to_owned(),
            ));
        }

        let address = address.clone().into_address(id);
        for slot in saved.iter_mut().filter(|a| a.id == id) {
            slot.clone_from(&address);
        }

        Ok(Some(address))
    }

    async fn delete_address(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<bool, RepositoryError> {
        let mut addresses = self.addresses.write().await;
        let Some(saved) = addresses.get_mut(&user_id) else {
            return Ok(false);
        };
        let before = saved.len();
        saved.retain(|a| a.id != id);

        Ok(saved.len() < before)
    }
}
