use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use time::{Duration, OffsetDateTime};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, ForgotPasswordRequest, LoginRequest, PublicUser, RegisterRequest,
            ResetPasswordRequest, UpdatePasswordRequest, UpdateProfileRequest,
        },
        extractor::CurrentUser,
        password::{hash_password, verify_password},
        repo_types::{NewUser, ProfileChanges},
    },
    error::{ApiError, Message},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/profile", put(update_profile))
        .route("/auth/password", put(update_password))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password/:token", post(reset_password))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    payload.normalize();
    let errors = payload.validate();
    if !errors.is_empty() {
        warn!(count = errors.len(), "register payload rejected");
        return Err(ApiError::Validation(errors));
    }

    let taken = state
        .users
        .username_or_email_taken(Some(&payload.username), Some(&payload.email), None)
        .await?;
    if taken {
        warn!(email = %payload.email, "register collides with existing account");
        return Err(ApiError::Conflict("User already exists".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    // The unique constraints still backstop a register racing this check.
    let user = state
        .users
        .create(NewUser {
            username: payload.username,
            email: payload.email,
            password_hash,
        })
        .await?;
    let token = state.tokens.issue(user.id)?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: PublicUser::from(&user),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.normalize();
    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    // Unknown email and wrong password must stay indistinguishable on the
    // wire, both leave through InvalidCredentials.
    let user = match state.users.find_by_email(&payload.email).await? {
        Some(user) => user,
        None => {
            warn!(email = %payload.email, "login with unknown email");
            return Err(ApiError::InvalidCredentials);
        }
    };
    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = state.tokens.issue(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state, user, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(mut payload): Json<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    payload.normalize();
    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    if payload.username.is_some() || payload.email.is_some() {
        let taken = state
            .users
            .username_or_email_taken(
                payload.username.as_deref(),
                payload.email.as_deref(),
                Some(user.id),
            )
            .await?;
        if taken {
            warn!(user_id = %user.id, "profile update collides with another account");
            return Err(ApiError::Conflict("Username or email already taken".into()));
        }
    }

    let updated = state
        .users
        .update_profile(
            user.id,
            ProfileChanges {
                username: payload.username,
                email: payload.email,
                bio: payload.bio,
                avatar_url: payload.avatar_url,
            },
        )
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    info!(user_id = %updated.id, "profile updated");
    Ok(Json(PublicUser::from(&updated)))
}

#[instrument(skip(state, user, payload))]
pub async fn update_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<Json<Message>, ApiError> {
    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    if !verify_password(&payload.current_password, &user.password_hash)? {
        warn!(user_id = %user.id, "password change with wrong current password");
        return Err(ApiError::InvalidCredentials);
    }

    let hash = hash_password(&payload.new_password)?;
    state.users.set_password_hash(user.id, &hash).await?;
    info!(user_id = %user.id, "password updated");
    Ok(Json(Message {
        message: "Password updated successfully",
    }))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(mut payload): Json<ForgotPasswordRequest>,
) -> Result<Json<Message>, ApiError> {
    payload.normalize();
    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    if let Some(user) = state.users.find_by_email(&payload.email).await? {
        let token = generate_reset_token();
        let expires =
            OffsetDateTime::now_utc() + Duration::minutes(state.config.reset_token_ttl_minutes);
        state.users.set_reset_token(user.id, &token, expires).await?;
        state.mailer.send_password_reset(&user.email, &token).await?;
        info!(user_id = %user.id, "reset token stored");
    }

    // Same answer whether or not the address is registered.
    Ok(Json(Message {
        message: "If that email is registered, a password reset link has been sent",
    }))
}

#[instrument(skip(state, token, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<Message>, ApiError> {
    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let hash = hash_password(&payload.password)?;
    let consumed = state
        .users
        .consume_reset_token(&token, OffsetDateTime::now_utc(), &hash)
        .await?;
    if !consumed {
        warn!("reset attempted with an unknown or expired token");
        return Err(ApiError::InvalidResetToken);
    }

    info!("password reset completed");
    Ok(Json(Message {
        message: "Password has been reset",
    }))
}

/// 64 alphanumeric characters straight from the OS generator.
fn generate_reset_token() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}
