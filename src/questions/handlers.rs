use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractor::CurrentUser,
    error::{ApiError, Message},
    posts::{
        dto::CommentRequest,
        handlers::{author_snapshot, ensure_author, new_comment},
        repo_types::{Post, PostKind},
    },
    questions::dto::QuestionRequest,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/questions", get(list_questions).post(create_question))
        .route(
            "/questions/:id",
            get(get_question).put(update_question).delete(delete_question),
        )
        .route("/questions/:id/answers", post(add_answer))
}

/// Questions are the interview slice of the post collection.
async fn find_question(state: &AppState, id: Uuid) -> Result<Post, ApiError> {
    state
        .posts
        .find(id)
        .await?
        .filter(|post| post.kind == PostKind::Interview)
        .ok_or(ApiError::NotFound("Question"))
}

#[instrument(skip(state))]
pub async fn list_questions(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiError> {
    let questions = state.posts.by_kind(PostKind::Interview).await?;
    Ok(Json(questions))
}

#[instrument(skip(state))]
pub async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Post>, ApiError> {
    let question = find_question(&state, id).await?;
    Ok(Json(question))
}

#[instrument(skip(state, user, payload))]
pub async fn create_question(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<QuestionRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let question = state
        .posts
        .insert(payload.into_new_post(author_snapshot(&user)))
        .await?;
    info!(post_id = %question.id, "question created");
    Ok((StatusCode::CREATED, Json(question)))
}

#[instrument(skip(state, user, payload))]
pub async fn update_question(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuestionRequest>,
) -> Result<Json<Post>, ApiError> {
    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let question = find_question(&state, id).await?;
    ensure_author(&question, &user)?;

    let updated = state
        .posts
        .update(id, payload.into_changes())
        .await?
        .ok_or(ApiError::NotFound("Question"))?;
    info!(post_id = %updated.id, "question updated");
    Ok(Json(updated))
}

#[instrument(skip(state, user))]
pub async fn delete_question(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, ApiError> {
    let question = find_question(&state, id).await?;
    ensure_author(&question, &user)?;

    state.posts.delete(id).await?;
    info!(post_id = %id, "question deleted");
    Ok(Json(Message {
        message: "Question removed",
    }))
}

#[instrument(skip(state, user, payload))]
pub async fn add_answer(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let question = find_question(&state, id).await?;
    let answer = new_comment(&user, &payload.content);
    let updated = state
        .posts
        .append_comment(question.id, answer)
        .await?
        .ok_or(ApiError::NotFound("Question"))?;
    info!(post_id = %updated.id, answers = updated.comments.len(), "answer appended");
    Ok((StatusCode::CREATED, Json(updated)))
}
