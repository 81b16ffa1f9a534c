use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{auth::repo_types::User, error::FieldError};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Request body for registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn normalize(&mut self) {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_lowercase();
    }

    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.username.len() < 3 {
            errors.push(FieldError::new(
                "username",
                "Username must be at least 3 characters",
            ));
        }
        if !is_valid_email(&self.email) {
            errors.push(FieldError::new("email", "Invalid email"));
        }
        if self.password.len() < 6 {
            errors.push(FieldError::new(
                "password",
                "Password must be at least 6 characters",
            ));
        }
        errors
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn normalize(&mut self) {
        self.email = self.email.trim().to_lowercase();
    }

    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if !is_valid_email(&self.email) {
            errors.push(FieldError::new("email", "Invalid email"));
        }
        errors
    }
}

/// Request body for profile updates. Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl UpdateProfileRequest {
    pub fn normalize(&mut self) {
        if let Some(username) = &mut self.username {
            *username = username.trim().to_string();
        }
        if let Some(email) = &mut self.email {
            *email = email.trim().to_lowercase();
        }
        if let Some(bio) = &mut self.bio {
            *bio = bio.trim().to_string();
        }
        if let Some(avatar_url) = &mut self.avatar_url {
            *avatar_url = avatar_url.trim().to_string();
        }
    }

    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if let Some(username) = &self.username {
            if username.len() < 3 {
                errors.push(FieldError::new(
                    "username",
                    "Username must be at least 3 characters",
                ));
            }
        }
        if let Some(email) = &self.email {
            if !is_valid_email(email) {
                errors.push(FieldError::new("email", "Invalid email"));
            }
        }
        errors
    }
}

/// Request body for changing the password while logged in.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

impl UpdatePasswordRequest {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.new_password.len() < 6 {
            errors.push(FieldError::new(
                "newPassword",
                "Password must be at least 6 characters",
            ));
        }
        errors
    }
}

/// Request body for starting a password reset.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

impl ForgotPasswordRequest {
    pub fn normalize(&mut self) {
        self.email = self.email.trim().to_lowercase();
    }

    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if !is_valid_email(&self.email) {
            errors.push(FieldError::new("email", "Invalid email"));
        }
        errors
    }
}

/// Request body for completing a password reset.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

impl ResetPasswordRequest {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.password.len() < 6 {
            errors.push(FieldError::new(
                "password",
                "Password must be at least 6 characters",
            ));
        }
        errors
    }
}

/// Account fields safe to show to any client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            bio: user.bio.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

/// Response for register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}
