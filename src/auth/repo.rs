use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::repo_types::{NewUser, ProfileChanges, User},
    error::StoreError,
};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, bio, avatar_url, reset_token, reset_token_expires, created_at";

/// Persistence seam for accounts. Handlers only ever see this trait, so tests
/// can stand in an in-memory double for Postgres.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    /// True if another account (excluding `exclude`, when given) already holds
    /// one of the offered identifiers.
    async fn username_or_email_taken(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        exclude: Option<Uuid>,
    ) -> Result<bool, StoreError>;
    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Option<User>, StoreError>;
    async fn set_password_hash(&self, id: Uuid, hash: &str) -> Result<(), StoreError>;
    async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expires: OffsetDateTime,
    ) -> Result<(), StoreError>;
    /// Replace the password of whichever account holds a live `token`, and
    /// clear the token in the same statement. Returns false on a miss, which
    /// covers unknown, expired and already-consumed tokens alike.
    async fn consume_reset_token(
        &self,
        token: &str,
        now: OffsetDateTime,
        new_hash: &str,
    ) -> Result<bool, StoreError>;
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_unique_violation(err: sqlx::Error, message: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            StoreError::Conflict(message.to_string())
        }
        _ => StoreError::from(err),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "User already exists"))?;
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn username_or_email_taken(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        exclude: Option<Uuid>,
    ) -> Result<bool, StoreError> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE (($1::text IS NOT NULL AND username = $1)
                    OR ($2::text IS NOT NULL AND email = $2))
                  AND ($3::uuid IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Option<User>, StoreError> {
        let updated = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                email = COALESCE($3, email),
                bio = COALESCE($4, bio),
                avatar_url = COALESCE($5, avatar_url)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.username)
        .bind(&changes.email)
        .bind(&changes.bio)
        .bind(&changes.avatar_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Username or email already taken"))?;
        Ok(updated)
    }

    async fn set_password_hash(&self, id: Uuid, hash: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expires: OffsetDateTime,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET reset_token = $2, reset_token_expires = $3 WHERE id = $1")
            .bind(id)
            .bind(token)
            .bind(expires)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        now: OffsetDateTime,
        new_hash: &str,
    ) -> Result<bool, StoreError> {
        // One statement, so a token can never be spent twice.
        let row = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE users
            SET password_hash = $2, reset_token = NULL, reset_token_expires = NULL
            WHERE reset_token = $1 AND reset_token_expires > $3
            RETURNING id
            "#,
        )
        .bind(token)
        .bind(new_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }
}
