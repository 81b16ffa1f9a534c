use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    error::StoreError,
    posts::repo_types::{Comment, NewPost, Post, PostChanges, PostKind},
};

const POST_COLUMNS: &str = "id, kind, title, content, author_id, author_name, comments, \
     image_url, link_url, meeting_date, meeting_time, location, created_at, updated_at";

/// Slice of the meeting timeline served by the events routes.
#[derive(Debug, Clone, Copy)]
pub enum MeetingWindow {
    All,
    Upcoming(OffsetDateTime),
    Past(OffsetDateTime),
}

/// Persistence seam for the post collection and its views.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert(&self, post: NewPost) -> Result<Post, StoreError>;
    /// Every post, newest first.
    async fn all(&self) -> Result<Vec<Post>, StoreError>;
    /// Posts of one kind, newest first.
    async fn by_kind(&self, kind: PostKind) -> Result<Vec<Post>, StoreError>;
    /// Meetings ordered by meeting date: ascending for All/Upcoming,
    /// descending (most recent first) for Past.
    async fn meetings(&self, window: MeetingWindow) -> Result<Vec<Post>, StoreError>;
    async fn find(&self, id: Uuid) -> Result<Option<Post>, StoreError>;
    async fn update(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
    /// Atomic append: one statement, so two concurrent comments can never
    /// lose each other, and field updates can never clobber the sequence.
    async fn append_comment(&self, id: Uuid, comment: Comment)
        -> Result<Option<Post>, StoreError>;
}

pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn insert(&self, post: NewPost) -> Result<Post, StoreError> {
        let created = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (id, kind, title, content, author_id, author_name,
                               comments, image_url, link_url, meeting_date, meeting_time, location)
            VALUES ($1, $2, $3, $4, $5, $6, '[]'::jsonb, $7, $8, $9, $10, $11)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(post.kind.as_str())
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.author.id)
        .bind(&post.author.name)
        .bind(&post.image_url)
        .bind(&post.link_url)
        .bind(post.meeting_date)
        .bind(&post.meeting_time)
        .bind(&post.location)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn all(&self) -> Result<Vec<Post>, StoreError> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn by_kind(&self, kind: PostKind) -> Result<Vec<Post>, StoreError> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE kind = $1 ORDER BY created_at DESC"
        ))
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn meetings(&self, window: MeetingWindow) -> Result<Vec<Post>, StoreError> {
        let posts = match window {
            MeetingWindow::All => {
                sqlx::query_as::<_, Post>(&format!(
                    "SELECT {POST_COLUMNS} FROM posts WHERE kind = 'meeting' \
                     ORDER BY meeting_date ASC NULLS LAST"
                ))
                .fetch_all(&self.pool)
                .await?
            }
            MeetingWindow::Upcoming(now) => {
                sqlx::query_as::<_, Post>(&format!(
                    "SELECT {POST_COLUMNS} FROM posts \
                     WHERE kind = 'meeting' AND meeting_date >= $1 \
                     ORDER BY meeting_date ASC"
                ))
                .bind(now)
                .fetch_all(&self.pool)
                .await?
            }
            MeetingWindow::Past(now) => {
                sqlx::query_as::<_, Post>(&format!(
                    "SELECT {POST_COLUMNS} FROM posts \
                     WHERE kind = 'meeting' AND meeting_date < $1 \
                     ORDER BY meeting_date DESC"
                ))
                .bind(now)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(posts)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    async fn update(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>, StoreError> {
        let updated = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                image_url = COALESCE($4, image_url),
                link_url = COALESCE($5, link_url),
                meeting_date = COALESCE($6, meeting_date),
                meeting_time = COALESCE($7, meeting_time),
                location = COALESCE($8, location),
                updated_at = now()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.content)
        .bind(&changes.image_url)
        .bind(&changes.link_url)
        .bind(changes.meeting_date)
        .bind(&changes.meeting_time)
        .bind(&changes.location)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn append_comment(
        &self,
        id: Uuid,
        comment: Comment,
    ) -> Result<Option<Post>, StoreError> {
        let updated = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET comments = comments || $2::jsonb, updated_at = now()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(Json(&comment))
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }
}
