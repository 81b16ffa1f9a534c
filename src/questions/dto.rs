use serde::Deserialize;

use crate::{
    error::FieldError,
    posts::repo_types::{Author, NewPost, PostChanges, PostKind},
};

/// Body for creating or replacing a question. Just title and content; the
/// answer thread grows through the append route.
#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub title: String,
    pub content: String,
}

impl QuestionRequest {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(FieldError::new("title", "Title is required"));
        }
        if self.content.trim().is_empty() {
            errors.push(FieldError::new("content", "Content is required"));
        }
        errors
    }

    pub fn into_new_post(self, author: Author) -> NewPost {
        NewPost {
            kind: PostKind::Interview,
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            author,
            image_url: None,
            link_url: None,
            meeting_date: None,
            meeting_time: None,
            location: None,
        }
    }

    pub fn into_changes(self) -> PostChanges {
        PostChanges {
            title: Some(self.title.trim().to_string()),
            content: Some(self.content.trim().to_string()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn title_and_content_are_mandatory() {
        let req = QuestionRequest {
            title: "".into(),
            content: "   ".into(),
        };
        let fields: Vec<&str> = req.validate().iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["title", "content"]);
    }

    #[test]
    fn builds_an_interview_post() {
        let req = QuestionRequest {
            title: " How did you land your first job? ".into(),
            content: "Looking for advice".into(),
        };
        assert!(req.validate().is_empty());
        let new_post = req.into_new_post(Author {
            id: Uuid::new_v4(),
            name: "alice".into(),
        });
        assert_eq!(new_post.kind, PostKind::Interview);
        assert_eq!(new_post.title, "How did you land your first job?");
    }
}
