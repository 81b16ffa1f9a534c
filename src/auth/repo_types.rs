use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// A stored account. The hash and reset-token columns never leave the store
/// layer in any response body.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub reset_token: Option<String>,
    pub reset_token_expires: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

/// Insert payload for registration. The secret arrives already hashed.
#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Partial profile update. `None` leaves a field untouched; `Some("")` on
/// bio/avatar stores the empty string.
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}
