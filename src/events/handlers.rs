use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractor::CurrentUser,
    error::{ApiError, Message},
    events::dto::EventRequest,
    posts::{
        dto::CommentRequest,
        handlers::{author_snapshot, ensure_author, new_comment},
        repo::MeetingWindow,
        repo_types::{Post, PostKind},
    },
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/upcoming", get(list_upcoming))
        .route("/events/past", get(list_past))
        .route(
            "/events/:id",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/events/:id/comments", post(add_comment))
}

/// Events are the meeting slice of the post collection; an id of any other
/// kind is a miss here.
async fn find_event(state: &AppState, id: Uuid) -> Result<Post, ApiError> {
    state
        .posts
        .find(id)
        .await?
        .filter(|post| post.kind == PostKind::Meeting)
        .ok_or(ApiError::NotFound("Event"))
}

#[instrument(skip(state))]
pub async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiError> {
    let events = state.posts.meetings(MeetingWindow::All).await?;
    Ok(Json(events))
}

#[instrument(skip(state))]
pub async fn list_upcoming(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiError> {
    let now = OffsetDateTime::now_utc();
    let events = state.posts.meetings(MeetingWindow::Upcoming(now)).await?;
    Ok(Json(events))
}

#[instrument(skip(state))]
pub async fn list_past(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiError> {
    let now = OffsetDateTime::now_utc();
    let events = state.posts.meetings(MeetingWindow::Past(now)).await?;
    Ok(Json(events))
}

#[instrument(skip(state))]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Post>, ApiError> {
    let event = find_event(&state, id).await?;
    Ok(Json(event))
}

#[instrument(skip(state, user, payload))]
pub async fn create_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<EventRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let new_post = payload.into_new_post(author_snapshot(&user))?;
    let event = state.posts.insert(new_post).await?;
    info!(post_id = %event.id, "event created");
    Ok((StatusCode::CREATED, Json(event)))
}

#[instrument(skip(state, user, payload))]
pub async fn update_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<EventRequest>,
) -> Result<Json<Post>, ApiError> {
    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let event = find_event(&state, id).await?;
    ensure_author(&event, &user)?;

    let updated = state
        .posts
        .update(id, payload.into_changes()?)
        .await?
        .ok_or(ApiError::NotFound("Event"))?;
    info!(post_id = %updated.id, "event updated");
    Ok(Json(updated))
}

#[instrument(skip(state, user))]
pub async fn delete_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, ApiError> {
    let event = find_event(&state, id).await?;
    ensure_author(&event, &user)?;

    state.posts.delete(id).await?;
    info!(post_id = %id, "event deleted");
    Ok(Json(Message {
        message: "Event removed",
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

    let event = find_event(&state, id).await?;
    let comment = new_comment(&user, &payload.content);
    let updated = state
        .posts
        .append_comment(event.id, comment)
        .await?
        .ok_or(ApiError::NotFound("Event"))?;
    info!(post_id = %updated.id, comments = updated.comments.len(), "comment appended");
    Ok((StatusCode::CREATED, Json(updated)))
}
