use serde::Deserialize;

use crate::{
    error::FieldError,
    posts::{
        dto::{clean_opt, parse_rfc3339},
        repo_types::{Author, NewPost, PostChanges, PostKind},
    },
};

/// Body for creating or replacing an event. Unlike the generic post surface,
/// title, content, meeting date and meeting time are all mandatory here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub title: String,
    pub content: String,
    pub meeting_date: String,
    pub meeting_time: String,
    pub location: Option<String>,
}

impl EventRequest {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(FieldError::new("title", "Title is required"));
        }
        if self.content.trim().is_empty() {
            errors.push(FieldError::new("content", "Content is required"));
        }
        if parse_rfc3339(self.meeting_date.trim()).is_err() {
            errors.push(FieldError::new(
                "meetingDate",
                "Must be a valid ISO 8601 date",
            ));
        }
        if self.meeting_time.trim().is_empty() {
            errors.push(FieldError::new("meetingTime", "Meeting time is required"));
        }
        errors
    }

    pub fn into_new_post(self, author: Author) -> anyhow::Result<NewPost> {
        Ok(NewPost {
            kind: PostKind::Meeting,
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            author,
            image_url: None,
            link_url: None,
            meeting_date: Some(parse_rfc3339(self.meeting_date.trim())?),
            meeting_time: Some(self.meeting_time.trim().to_string()),
            location: clean_opt(self.location),
        })
    }

    /// Full replacement of the event fields; an absent location keeps the
    /// stored one.
    pub fn into_changes(self) -> anyhow::Result<PostChanges> {
        Ok(PostChanges {
            title: Some(self.title.trim().to_string()),
            content: Some(self.content.trim().to_string()),
            meeting_date: Some(parse_rfc3339(self.meeting_date.trim())?),
            meeting_time: Some(self.meeting_time.trim().to_string()),
            location: clean_opt(self.location),
            ..Default::default()
        })
    }
}
