use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{extractor::CurrentUser, repo_types::User},
    error::{ApiError, Message},
    posts::{
        dto::{CommentRequest, CreatePostRequest, UpdatePostRequest},
        repo_types::{Author, Comment, Post, PostKind},
    },
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/type/:kind", get(list_posts_by_type))
        .route(
            "/posts/:id",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/posts/:id/comments", post(add_comment))
}

/// Author snapshot for a post or comment written by `user` right now.
pub(crate) fn author_snapshot(user: &User) -> Author {
    Author {
        id: user.id,
        name: user.username.clone(),
    }
}

pub(crate) fn new_comment(user: &User, content: &str) -> Comment {
    Comment {
        id: Uuid::new_v4(),
        content: content.trim().to_string(),
        author: author_snapshot(user),
        created_at: OffsetDateTime::now_utc(),
    }
}

/// Author-equality gate shared by every update/delete route. There is no
/// role override.
pub(crate) fn ensure_author(post: &Post, user: &User) -> Result<(), ApiError> {
    if post.author.id != user.id {
        warn!(post_id = %post.id, user_id = %user.id, "mutation by non-author rejected");
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

#[instrument(skip(state))]
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiError> {
    let posts = state.posts.all().await?;
    Ok(Json(posts))
}

#[instrument(skip(state))]
pub async fn list_posts_by_type(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<Vec<Post>>, ApiError> {
    // An unrecognized type filter matches nothing rather than erroring.
    let posts = match kind.parse::<PostKind>() {
        Ok(kind) => state.posts.by_kind(kind).await?,
        Err(_) => Vec::new(),
    };
    Ok(Json(posts))
}

#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Post>, ApiError> {
    let post = state
        .posts
        .find(id)
        .await?
        .ok_or(ApiError::NotFound("Post"))?;
    Ok(Json(post))
}

#[instrument(skip(state, user, payload))]
pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let new_post = payload.into_new_post(author_snapshot(&user))?;
    let post = state.posts.insert(new_post).await?;
    info!(post_id = %post.id, kind = post.kind.as_str(), "post created");
    Ok((StatusCode::CREATED, Json(post)))
}

#[instrument(skip(state, user, payload))]
pub async fn update_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<Post>, ApiError> {
    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let post = state
        .posts
        .find(id)
        .await?
        .ok_or(ApiError::NotFound("Post"))?;
    ensure_author(&post, &user)?;

    let updated = state
        .posts
        .update(id, payload.into_changes()?)
        .await?
        .ok_or(ApiError::NotFound("Post"))?;
    info!(post_id = %updated.id, "post updated");
    Ok(Json(updated))
}

#[instrument(skip(state, user))]
pub async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, ApiError> {
    let post = state
        .posts
        .find(id)
        .await?
        .ok_or(ApiError::NotFound("Post"))?;
    ensure_author(&post, &user)?;

    state.posts.delete(id).await?;
    info!(post_id = %id, "post deleted");
    Ok(Json(Message {
        message: "Post removed",
    }))
}

#[instrument(skip(state, user, payload))]
pub async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let comment = new_comment(&user, &payload.content);
    let post = state
        .posts
        .append_comment(id, comment)
        .await?
        .ok_or(ApiError::NotFound("Post"))?;
    info!(post_id = %post.id, comments = post.comments.len(), "comment appended");
    Ok((StatusCode::CREATED, Json(post)))
}
