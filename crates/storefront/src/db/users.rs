//! User repository for database operations.
//!
//! The password hash and the reset-token fields are only ever read here;
//! domain [`User`] values never carry them.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use loomline_core::{Email, Role, UserId};

use super::RepositoryError;
use crate::models::product::PhotoRef;
use crate::models::user::User;

const USER_COLUMNS: &str = "id, name, email, role, photo_id, photo_url, created_at";

#[derive(FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    role: String,
    photo_id: Option<String>,
    photo_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role = self.role.parse::<Role>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid role in database: {e}"))
        })?;

        let photo = match (self.photo_id, self.photo_url) {
            (Some(id), Some(url)) => Some(PhotoRef { id, url }),
            _ => None,
        };

        Ok(User {
            id: UserId::new(self.id),
            name: self.name,
            email,
            role,
            photo,
            created_at: self.created_at,
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

    /// Create a new user account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
        photo: Option<&PhotoRef>,
    ) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO store_user (name, email, password_hash, photo_id, photo_url) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(email.as_str())
        .bind(password_hash)
        .bind(photo.map(|p| p.id.as_str()))
        .bind(photo.map(|p| p.url.as_str()))
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.into_user()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such user exists.
    pub async fn find(&self, id: UserId) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM store_user WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.into_user()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM store_user WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// Get a user and their password hash by email.
    ///
    /// Returns `None` if the user doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT id, password_hash FROM store_user WHERE email = $1")
                .bind(email.as_str())
                .fetch_optional(self.pool)
                .await?;

        let Some((id, password_hash)) = row else {
            return Ok(None);
        };

        let user = self.find(UserId::new(id)).await?;
        Ok(Some((user, password_hash)))
    }

    /// Get a user's password hash by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such user exists.
    pub async fn get_password_hash_by_id(&self, id: UserId) -> Result<String, RepositoryError> {
        let hash: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM store_user WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        hash.ok_or(RepositoryError::NotFound)
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such user exists.
    pub async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE store_user SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Update a user's own profile fields. The photo is only replaced when
    /// a new reference is provided.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such user exists.
    /// Returns `RepositoryError::Conflict` if the new email is taken.
    pub async fn update_profile(
        &self,
        id: UserId,
        name: &str,
        email: &Email,
        photo: Option<&PhotoRef>,
    ) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE store_user \
             SET name = $1, email = $2, \
                 photo_id = COALESCE($3, photo_id), \
                 photo_url = COALESCE($4, photo_url) \
             WHERE id = $5 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(email.as_str())
        .bind(photo.map(|p| p.id.as_str()))
        .bind(photo.map(|p| p.url.as_str()))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.ok_or(RepositoryError::NotFound)?.into_user()
    }

    /// Admin update: name, email, and role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such user exists.
    /// Returns `RepositoryError::Conflict` if the new email is taken.
    pub async fn update_account(
        &self,
        id: UserId,
        name: &str,
        email: &Email,
        role: Role,
    ) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE store_user SET name = $1, email = $2, role = $3 \
             WHERE id = $4 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(email.as_str())
        .bind(role.as_str())
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.ok_or(RepositoryError::NotFound)?.into_user()
    }

    /// All user accounts, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let rows: Vec<UserRow> = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM store_user ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(UserRow::into_user).collect()
    }

    /// Delete a user account, returning its last state so callers can
    /// clean up the photo in media storage.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such user exists.
    pub async fn delete(&self, id: UserId) -> Result<User, RepositoryError> {
        let user = self.find(id).await?;

        sqlx::query("DELETE FROM store_user WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(user)
    }

    /// Store a password-reset token digest and its expiry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such user exists.
    pub async fn set_reset_token(
        &self,
        id: UserId,
        token_digest: &str,
        expiry: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE store_user \
             SET forgot_password_token = $1, forgot_password_expiry = $2 \
             WHERE id = $3",
        )
        .bind(token_digest)
        .bind(expiry)
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Clear the password-reset token fields.
    ///
    /// Used both after a successful reset and as compensation when the
    /// reset email cannot be dispatched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear_reset_token(&self, id: UserId) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE store_user \
             SET forgot_password_token = NULL, forgot_password_expiry = NULL \
             WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Find the user holding an unexpired reset-token digest.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_reset_token(
        &self,
        token_digest: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM store_user \
             WHERE forgot_password_token = $1 AND forgot_password_expiry > now()"
        ))
        .bind(token_digest)
        .fetch_optional(self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }
}
