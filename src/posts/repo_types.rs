use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, types::Json, FromRow, Row};
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

/// Canonical post type. Every route family is a view over this one enum:
/// `/posts` sees all three, `/events` the meetings, `/questions` the
/// interviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Blog,
    Interview,
    Meeting,
}

impl PostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostKind::Blog => "blog",
            PostKind::Interview => "interview",
            PostKind::Meeting => "meeting",
        }
    }
}

impl FromStr for PostKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blog" => Ok(PostKind::Blog),
            "interview" => Ok(PostKind::Interview),
            "meeting" => Ok(PostKind::Meeting),
            other => anyhow::bail!("unknown post type: {other}"),
        }
    }
}

/// Author snapshot frozen at write time. The display name is point-in-time:
/// a later username change does not rewrite old posts or comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: Uuid,
    pub name: String,
}

/// One entry in a post's append-only comment sequence. Stored as JSON inside
/// the parent row, so the serialized field names are the wire names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub author: Author,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub title: String,
    pub content: String,
    pub author: Author,
    pub comments: Vec<Comment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub meeting_date: Option<OffsetDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl FromRow<'_, PgRow> for Post {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let kind: String = row.try_get("kind")?;
        let kind = kind
            .parse::<PostKind>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "kind".into(),
                source: e.into(),
            })?;
        let comments: Json<Vec<Comment>> = row.try_get("comments")?;
        Ok(Self {
            id: row.try_get("id")?,
            kind,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            author: Author {
                id: row.try_get("author_id")?,
                name: row.try_get("author_name")?,
            },
            comments: comments.0,
            image_url: row.try_get("image_url")?,
            link_url: row.try_get("link_url")?,
            meeting_date: row.try_get("meeting_date")?,
            meeting_time: row.try_get("meeting_time")?,
            location: row.try_get("location")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Insert payload, already validated.
#[derive(Debug)]
pub struct NewPost {
    pub kind: PostKind,
    pub title: String,
    pub content: String,
    pub author: Author,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub meeting_date: Option<OffsetDateTime>,
    pub meeting_time: Option<String>,
    pub location: Option<String>,
}

/// Partial update. `None` keeps the stored value; the comment sequence is
/// never touched by a field update.
#[derive(Debug, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub meeting_date: Option<OffsetDateTime>,
    pub meeting_time: Option<String>,
    pub location: Option<String>,
}
