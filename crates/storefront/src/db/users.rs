//! User repository for database operations.
//!
//! This module provides database access for users, their password hashes,
//! and their saved addresses.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bazaar_core::{AddressId, Email, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::address::{Address, AddressInput};
use crate::models::user::User;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    name: String,
    phone_number: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserWithPasswordRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: Option<String>,
}

impl UserWithPasswordRow {
    fn into_pair(self) -> Result<Option<(User, String)>, RepositoryError> {
        let Some(password_hash) = self.password_hash else {
            return Ok(None);
        };
        Ok(Some((User::try_from(self.user)?, password_hash)))
    }
}

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: AddressId,
    address_type: String,
    country: String,
    city: String,
    address1: String,
    address2: Option<String>,
    zip_code: String,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            address_type: row.address_type,
            country: row.country,
            city: row.city,
            address1: row.address1,
            address2: row.address2,
            zip_code: row.zip_code,
        }
    }
}


impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            email,
            name: row.name,
            phone_number: row.phone_number,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, name, phone_number, created_at, updated_at
            FROM storefront.user
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Create a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        email: &Email,
        name: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO storefront.user (email, name)
            VALUES ($1, $2)
            RETURNING id, email, name, phone_number, created_at, updated_at
            ",
        )
        .bind(email.as_str())
        .bind(name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "email already exists"))?;

        let user = User::try_from(row)?;

        sqlx::query(
            r"
            INSERT INTO storefront.user_password (user_id, password_hash)
            VALUES ($1, $2)
            ",
        )
        .bind(user.id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(user)
    }

    /// Get a user and their password hash by email.
    ///
    /// Returns `None` if the user doesn't exist or has no password set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithPasswordRow>(
            r"
            SELECT u.id, u.email, u.name, u.phone_number, u.created_at, u.updated_at, p.password_hash
            FROM storefront.user u
            LEFT JOIN storefront.user_password p ON u.id = p.user_id
            WHERE u.email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map_or(Ok(None), UserWithPasswordRow::into_pair)
    }

    /// Get a user and their password hash by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithPasswordRow>(
            r"
            SELECT u.id, u.email, u.name, u.phone_number, u.created_at, u.updated_at, p.password_hash
            FROM storefront.user u
            LEFT JOIN storefront.user_password p ON u.id = p.user_id
            WHERE u.id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map_or(Ok(None), UserWithPasswordRow::into_pair)
    }

    /// Replace a user's name, email, and phone number.
    ///
    /// Returns `None` if the user doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if another account has the email.
    pub async fn update_profile(
        &self,
        id: UserId,
        email: &Email,
        name: &str,
        phone_number: Option<&str>,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE storefront.user
            SET email = $2, name = $3, phone_number = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, name, phone_number, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(email.as_str())
        .bind(name)
        .bind(phone_number)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email already exists"))?;

        row.map(User::try_from).transpose()
    }

    /// Store a new password hash for a user.
    ///
    /// Returns `false` if the user doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            INSERT INTO storefront.user_password (user_id, password_hash)
            SELECT id, $2 FROM storefront.user WHERE id = $1
            ON CONFLICT (user_id) DO UPDATE SET password_hash = EXCLUDED.password_hash
            ",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("UPDATE storefront.user SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(true)
    }

    /// List a user's saved addresses, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_addresses(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, address_type, country, city, address1, address2, zip_code
            FROM storefront.user_address
            WHERE user_id = $1
            ORDER BY id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Address::from).collect())
    }

    /// Save a new address for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already has an address
    /// of this type.
    pub async fn insert_address(
        &self,
        user_id: UserId,
        address: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(
            r"
            INSERT INTO storefront.user_address
                (user_id, address_type, country, city, address1, address2, zip_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, address_type, country, city, address1, address2, zip_code
            ",
        )
        .bind(user_id)
        .bind(&address.address_type)
        .bind(&address.country)
        .bind(&address.city)
        .bind(&address.address1)
        .bind(address.address2.as_deref())
        .bind(&address.zip_code)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "address type already exists"))?;

        Ok(row.into())
    }

    /// Replace one of a user's saved addresses.
    ///
    /// Returns `None` if the user has no address with this ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new type collides with
    /// another of the user's addresses.
    pub async fn update_address(
        &self,
        user_id: UserId,
        id: AddressId,
        address: &AddressInput,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(
            r"
            UPDATE storefront.user_address
            SET address_type = $3, country = $4, city = $5,
                address1 = $6, address2 = $7, zip_code = $8
            WHERE user_id = $1 AND id = $2
            RETURNING id, address_type, country, city, address1, address2, zip_code
            ",
        )
        .bind(user_id)
        .bind(id)
        .bind(&address.address_type)
        .bind(&address.country)
        .bind(&address.city)
        .bind(&address.address1)
        .bind(address.address2.as_deref())
        .bind(&address.zip_code)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "address type already exists"))?;

        Ok(row.map(Address::from))
    }

    /// Delete one of a user's saved addresses.
    ///
    /// Returns `false` if the user has no address with this ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_address(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM storefront.user_address WHERE user_id = $1 AND id = $2")
                .bind(user_id)
                .bind(id)
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
