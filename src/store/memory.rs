use std::{
    collections::HashMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserStore,
        repo_types::{NewUser, ProfileChanges, User},
    },
    error::StoreError,
    posts::{
        repo::{MeetingWindow, PostStore},
        repo_types::{Comment, NewPost, Post, PostChanges, PostKind},
    },
};

/// In-memory stand-in for Postgres: one lock-guarded map per table, with the
/// same conflict and single-use semantics as the SQL statements. Backs
/// `AppState::fake()` and the test suites.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    posts: RwLock<HashMap<Uuid, Post>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn users_read(&self) -> Result<RwLockReadGuard<'_, HashMap<Uuid, User>>, StoreError> {
        self.users
            .read()
            .map_err(|_| StoreError::Other(anyhow::anyhow!("user table lock poisoned")))
    }

    fn users_write(&self) -> Result<RwLockWriteGuard<'_, HashMap<Uuid, User>>, StoreError> {
        self.users
            .write()
            .map_err(|_| StoreError::Other(anyhow::anyhow!("user table lock poisoned")))
    }

    fn posts_read(&self) -> Result<RwLockReadGuard<'_, HashMap<Uuid, Post>>, StoreError> {
        self.posts
            .read()
            .map_err(|_| StoreError::Other(anyhow::anyhow!("post table lock poisoned")))
    }

    fn posts_write(&self) -> Result<RwLockWriteGuard<'_, HashMap<Uuid, Post>>, StoreError> {
        self.posts
            .write()
            .map_err(|_| StoreError::Other(anyhow::anyhow!("post table lock poisoned")))
    }
}

fn newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

fn by_meeting_date_asc(posts: &mut [Post]) {
    posts.sort_by(|a, b| match (a.meeting_date, b.meeting_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users_write()?;
        if users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(StoreError::Conflict("User already exists".into()));
        }
        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            bio: None,
            avatar_url: None,
            reset_token: None,
            reset_token_expires: None,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users_read()?.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users_read()?
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn username_or_email_taken(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        exclude: Option<Uuid>,
    ) -> Result<bool, StoreError> {
        Ok(self.users_read()?.values().any(|u| {
            exclude != Some(u.id)
                && (username.is_some_and(|name| u.username == name)
                    || email.is_some_and(|addr| u.email == addr))
        }))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users_write()?;
        let collision = users.values().any(|u| {
            u.id != id
                && (changes
                    .username
                    .as_deref()
                    .is_some_and(|name| u.username == name)
                    || changes.email.as_deref().is_some_and(|addr| u.email == addr))
        });
        if collision {
            return Err(StoreError::Conflict("Username or email already taken".into()));
        }
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(bio) = changes.bio {
            user.bio = Some(bio);
        }
        if let Some(avatar_url) = changes.avatar_url {
            user.avatar_url = Some(avatar_url);
        }
        Ok(Some(user.clone()))
    }

    async fn set_password_hash(&self, id: Uuid, hash: &str) -> Result<(), StoreError> {
        if let Some(user) = self.users_write()?.get_mut(&id) {
            user.password_hash = hash.to_string();
        }
        Ok(())
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token: &str,
        expires: OffsetDateTime,
    ) -> Result<(), StoreError> {
        if let Some(user) = self.users_write()?.get_mut(&id) {
            user.reset_token = Some(token.to_string());
            user.reset_token_expires = Some(expires);
        }
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        now: OffsetDateTime,
        new_hash: &str,
    ) -> Result<bool, StoreError> {
        let mut users = self.users_write()?;
        let holder = users.values_mut().find(|u| {
            u.reset_token.as_deref() == Some(token)
                && u.reset_token_expires.is_some_and(|exp| exp > now)
        });
        let Some(user) = holder else {
            return Ok(false);
        };
        user.password_hash = new_hash.to_string();
        user.reset_token = None;
        user.reset_token_expires = None;
        Ok(true)
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn insert(&self, post: NewPost) -> Result<Post, StoreError> {
        let now = OffsetDateTime::now_utc();
        let created = Post {
            id: Uuid::new_v4(),
            kind: post.kind,
            title: post.title,
            content: post.content,
            author: post.author,
            comments: Vec::new(),
            image_url: post.image_url,
            link_url: post.link_url,
            meeting_date: post.meeting_date,
            meeting_time: post.meeting_time,
            location: post.location,
            created_at: now,
            updated_at: now,
        };
        self.posts_write()?.insert(created.id, created.clone());
        Ok(created)
    }

    async fn all(&self) -> Result<Vec<Post>, StoreError> {
        let mut posts: Vec<Post> = self.posts_read()?.values().cloned().collect();
        newest_first(&mut posts);
        Ok(posts)
    }

    async fn by_kind(&self, kind: PostKind) -> Result<Vec<Post>, StoreError> {
        let mut posts: Vec<Post> = self
            .posts_read()?
            .values()
            .filter(|p| p.kind == kind)
            .cloned()
            .collect();
        newest_first(&mut posts);
        Ok(posts)
    }

    async fn meetings(&self, window: MeetingWindow) -> Result<Vec<Post>, StoreError> {
        let mut meetings: Vec<Post> = self
            .posts_read()?
            .values()
            .filter(|p| p.kind == PostKind::Meeting)
            .filter(|p| match window {
                MeetingWindow::All => true,
                MeetingWindow::Upcoming(now) => p.meeting_date.is_some_and(|d| d >= now),
                MeetingWindow::Past(now) => p.meeting_date.is_some_and(|d| d < now),
            })
            .cloned()
            .collect();
        by_meeting_date_asc(&mut meetings);
        if matches!(window, MeetingWindow::Past(_)) {
            meetings.reverse();
        }
        Ok(meetings)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        Ok(self.posts_read()?.get(&id).cloned())
    }

    async fn update(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>, StoreError> {
        let mut posts = self.posts_write()?;
        let Some(post) = posts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(content) = changes.content {
            post.content = content;
        }
        if let Some(image_url) = changes.image_url {
            post.image_url = Some(image_url);
        }
        if let Some(link_url) = changes.link_url {
            post.link_url = Some(link_url);
        }
        if let Some(meeting_date) = changes.meeting_date {
            post.meeting_date = Some(meeting_date);
        }
        if let Some(meeting_time) = changes.meeting_time {
            post.meeting_time = Some(meeting_time);
        }
        if let Some(location) = changes.location {
            post.location = Some(location);
        }
        post.updated_at = OffsetDateTime::now_utc();
        Ok(Some(post.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.posts_write()?.remove(&id).is_some())
    }

    async fn append_comment(
        &self,
        id: Uuid,
        comment: Comment,
    ) -> Result<Option<Post>, StoreError> {
        let mut posts = self.posts_write()?;
        let Some(post) = posts.get_mut(&id) else {
            return Ok(None);
        };
        post.comments.push(comment);
        post.updated_at = OffsetDateTime::now_utc();
        Ok(Some(post.clone()))
    }
}
