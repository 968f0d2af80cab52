use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::db::models::{FeedEntry, Post};
use crate::db::posts::DeleteOutcome;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::state::AppState;
use crate::uploads::{self, IncomingFile};

#[derive(Serialize)]
pub struct FeedResponse {
    pub posts: Vec<FeedEntry>,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    pub deleted_id: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .route("/feed", get(feed))
        .route("/posts/{post_id}", delete(delete_post))
}

/// POST /upload: multipart `file` plus optional `caption`
async fn upload(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<Post>)> {
    let mut file = None;
    let mut caption = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(multipart_error)?;
                file = Some(IncomingFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            Some("caption") => {
                caption = field
                    .text()
                    .await
                    .map_err(multipart_error)?;
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::Unprocessable("Field 'file' is required".into()))?;

    let post = uploads::publish(
        state.media.as_ref(),
        &state.posts,
        &state.config.scratch_path(),
        &user.id,
        file,
        caption,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// Body errors are the client's fault unless the stream itself broke.
fn multipart_error(err: MultipartError) -> AppError {
    let status = err.status();
    let detail = err.body_text();
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(detail)
    } else if status.is_client_error() {
        AppError::Unprocessable(detail)
    } else {
        AppError::UploadFailed(detail)
    }
}

/// GET /feed: every post, newest first
async fn feed(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<FeedResponse>> {
    let rows = state.posts.feed().await?;
    let posts = rows
        .into_iter()
        .map(|row| FeedEntry::for_viewer(row, &user.id))
        .collect();
    Ok(Json(FeedResponse { posts }))
}

/// DELETE /posts/{post_id}: only the owner may delete
async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
) -> AppResult<Json<DeleteResponse>> {
    let outcome = state
        .posts
        .delete_owned(&post_id, &user.id)
        .await
        .map_err(|e| AppError::Internal(format!("Error deleting post: {e}")))?;

    match outcome {
        DeleteOutcome::Deleted => {
            tracing::info!(post_id = %post_id, user_id = %user.id, "Post deleted");
            Ok(Json(DeleteResponse {
                success: true,
                message: "Post deleted successfully".to_string(),
                deleted_id: post_id,
            }))
        }
        DeleteOutcome::NotFound => Err(AppError::NotFound("Post not found".into())),
        DeleteOutcome::NotOwner => Err(AppError::Forbidden(
            "Not authorized to delete this post".into(),
        )),
    }
}
