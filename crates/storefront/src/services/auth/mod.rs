//! Authentication service.
//!
//! Provides password registration and login, plus the logged-in user's own
//! account management: profile, password, and saved addresses. The resulting
//! user identity is what cart operations are keyed by.

mod error;
mod store;

pub use error::AuthError;
pub use store::{MemoryUserStore, PgUserStore, UserStore};

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::instrument;

use bazaar_core::{AddressId, Email, UserId};

use crate::db::RepositoryError;
use crate::models::address::{Address, AddressInput};
use crate::models::user::{PublicProfile, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Register a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingName` if the name is blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, name, password))]
    pub async fn register_with_password(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }

        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create_with_password(&email, name, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        // Unparseable emails cannot belong to an account.
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

impl AuthService {
    /// Replace the user's name, email, and phone number after checking
    /// their current password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the password is wrong.
    /// Returns `AuthError::MissingName` or `AuthError::InvalidEmail` for bad input.
    /// Returns `AuthError::UserAlreadyExists` if another account has the email.
    /// Returns `AuthError::UserNotFound` if the account is gone.
    #[instrument(skip(self, name, email, phone_number, password))]
    pub async fn update_profile(
        &self,
        user_id: UserId,
        name: &str,
        email: &str,
        phone_number: Option<&str>,
        password: &str,
    ) -> Result<User, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }
        let email = Email::parse(email)?;
        let phone_number = phone_number.map(str::trim).filter(|p| !p.is_empty());

        let (_, password_hash) = self
            .users
            .get_password_hash_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        verify_password(password, &password_hash)?;

        let user = self
            .users
            .update_profile(user_id, &email, name, phone_number)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?
            .ok_or(AuthError::UserNotFound)?;

        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }

    /// Change the user's password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::IncorrectPassword` if `old_password` is wrong.
    /// Returns `AuthError::PasswordMismatch` if the confirmation differs.
    /// Returns `AuthError::WeakPassword` if the new password is too short.
    /// Returns `AuthError::UserNotFound` if the account is gone.
    #[instrument(skip(self, old_password, new_password, confirm_password))]
    pub async fn change_password(
        &self,
        user_id: UserId,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), AuthError> {
        let (_, password_hash) = self
            .users
            .get_password_hash_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        verify_password(old_password, &password_hash)
            .map_err(|_| AuthError::IncorrectPassword)?;

        if new_password != confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        validate_password(new_password)?;
        let password_hash = hash_password(new_password)?;

        if !self.users.set_password_hash(user_id, &password_hash).await? {
            return Err(AuthError::UserNotFound);
        }

        tracing::info!(%user_id, "Password changed");
        Ok(())
    }

    /// The user's saved addresses.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the store fails.
    pub async fn addresses(&self, user_id: UserId) -> Result<Vec<Address>, AuthError> {
        Ok(self.users.list_addresses(user_id).await?)
    }

    /// Add an address, or replace the one named by `address.id`, and return
    /// the full list.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidAddress` if a required field is blank.
    /// Returns `AuthError::DuplicateAddressType` if another saved address has the type.
    /// Returns `AuthError::AddressNotFound` if `address.id` names no saved address.
    /// Returns `AuthError::UserNotFound` if the account is gone.
    #[instrument(skip(self, address))]
    pub async fn save_address(
        &self,
        user_id: UserId,
        address: &AddressInput,
    ) -> Result<Vec<Address>, AuthError> {
        let address = address.normalized().map_err(AuthError::InvalidAddress)?;
        self.get_user(user_id).await?;

        let duplicate = |e: RepositoryError| match e {
            RepositoryError::Conflict(_) => {
                AuthError::DuplicateAddressType(address.address_type.clone())
            }
            other => AuthError::Repository(other),
        };

        match address.id {
            Some(id) => {
                self.users
                    .update_address(user_id, id, &address)
                    .await
                    .map_err(duplicate)?
                    .ok_or(AuthError::AddressNotFound)?;
            }
            None => {
                self.users
                    .insert_address(user_id, &address)
                    .await
                    .map_err(duplicate)?;
            }
        }

        self.addresses(user_id).await
    }

    /// Delete a saved address and return what remains.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AddressNotFound` if the user has no such address.
    #[instrument(skip(self))]
    pub async fn delete_address(
        &self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<Vec<Address>, AuthError> {
        if !self.users.delete_address(user_id, address_id).await? {
            return Err(AuthError::AddressNotFound);
        }

        self.addresses(user_id).await
    }

    /// Another user's public profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn public_profile(&self, user_id: UserId) -> Result<PublicProfile, AuthError> {
        Ok(self.get_user(user_id).await?.to_public_profile())
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService").finish_non_exhaustive()
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
