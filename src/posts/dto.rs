use serde::Deserialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::{
    error::FieldError,
    posts::repo_types::{Author, NewPost, PostChanges, PostKind},
};

/// Trimmed value of an optional field, with blank collapsed to `None`.
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub(crate) fn clean_opt(value: Option<String>) -> Option<String> {
    non_blank(&value).map(str::to_string)
}

pub(crate) fn parse_rfc3339(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(raw, &Rfc3339)
}

/// Request body for creating a post of any kind. The meeting fields only
/// matter for `type = meeting` but are accepted on every kind, matching the
/// permissive create surface.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub meeting_date: Option<String>,
    pub meeting_time: Option<String>,
    pub location: Option<String>,
}

impl CreatePostRequest {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(FieldError::new("title", "Title is required"));
        }
        if self.content.trim().is_empty() {
            errors.push(FieldError::new("content", "Content is required"));
        }
        if self.kind.parse::<PostKind>().is_err() {
            errors.push(FieldError::new(
                "type",
                "Type must be one of blog, interview, meeting",
            ));
        }
        if let Some(raw) = non_blank(&self.meeting_date) {
            if parse_rfc3339(raw).is_err() {
                errors.push(FieldError::new(
                    "meetingDate",
                    "Must be a valid ISO 8601 date",
                ));
            }
        }
        errors
    }

    /// Build the insert payload. Callers run `validate` first, so the parses
    /// here cannot fail on a payload that passed it.
    pub fn into_new_post(self, author: Author) -> anyhow::Result<NewPost> {
        let kind = self.kind.parse::<PostKind>()?;
        let meeting_date = match non_blank(&self.meeting_date) {
            Some(raw) => Some(parse_rfc3339(raw)?),
            None => None,
        };
        Ok(NewPost {
            kind,
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            author,
            image_url: clean_opt(self.image_url),
            link_url: clean_opt(self.link_url),
            meeting_date,
            meeting_time: clean_opt(self.meeting_time),
            location: clean_opt(self.location),
        })
    }
}

/// Request body for a partial update. Absent and blank fields both keep the
/// stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub meeting_date: Option<String>,
    pub meeting_time: Option<String>,
    pub location: Option<String>,
}

impl UpdatePostRequest {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if let Some(raw) = non_blank(&self.meeting_date) {
            if parse_rfc3339(raw).is_err() {
                errors.push(FieldError::new(
                    "meetingDate",
                    "Must be a valid ISO 8601 date",
                ));
            }
        }
        errors
    }

    pub fn into_changes(self) -> anyhow::Result<PostChanges> {
        let meeting_date = match non_blank(&self.meeting_date) {
            Some(raw) => Some(parse_rfc3339(raw)?),
            None => None,
        };
        Ok(PostChanges {
            title: clean_opt(self.title),
            content: clean_opt(self.content),
            image_url: clean_opt(self.image_url),
            link_url: clean_opt(self.link_url),
            meeting_date,
            meeting_time: clean_opt(self.meeting_time),
            location: clean_opt(self.location),
        })
    }
}

/// Request body for appending a comment.
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

impl CommentRequest {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.content.trim().is_empty() {
            errors.push(FieldError::new("content", "Content is required"));
        }
        errors
    }
}
