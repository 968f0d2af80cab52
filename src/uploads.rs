use std::path::Path;

use bytes::Bytes;

use crate::db::models::{FileType, NewPost, Post};
use crate::db::posts::PostStore;
use crate::db::DbError;
use crate::error::AppError;
use crate::media::{scratch, MediaError, MediaHost};

/// A file received from the client, fully buffered.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, thiserror::Error)]
enum UploadError {
    #[error("could not stage file: {0}")]
    Scratch(#[from] std::io::Error),

    #[error("{0}")]
    Media(#[from] MediaError),

    #[error("could not save post: {0}")]
    Persist(#[from] DbError),
}

/// Stage the file, hand it to the media host, then record the post.
///
/// Every failure surfaces as [`AppError::UploadFailed`]. The staged copy is removed
/// before this returns, on success and on failure alike.
pub async fn publish(
    media: &dyn MediaHost,
    posts: &PostStore,
    scratch_dir: &Path,
    owner_id: &str,
    file: IncomingFile,
    caption: String,
) -> Result<Post, AppError> {
    run(media, posts, scratch_dir, owner_id, file, caption)
        .await
        .map_err(|e| AppError::UploadFailed(e.to_string()))
}

async fn run(
    media: &dyn MediaHost,
    posts: &PostStore,
    scratch_dir: &Path,
    owner_id: &str,
    file: IncomingFile,
    caption: String,
) -> Result<Post, UploadError> {
    let file_type = FileType::from_content_type(file.content_type.as_deref());
    let staged = scratch::stage(scratch_dir, &file.file_name, file.data).await?;

    let stored = media.store(&staged, &file.file_name).await?;
    drop(staged);

    let new_post = NewPost {
        user_id: owner_id.to_string(),
        caption,
        url: stored.url.clone(),
        file_type,
        file_name: stored.stored_name().to_string(),
    };

    match posts.create(new_post).await {
        Ok(post) => {
            tracing::info!(post_id = %post.id, user_id = %owner_id, file_type = post.file_type.as_str(), "Post created");
            Ok(post)
        }
        Err(e) => {
            // The host keeps the blob; there is no remote delete to roll it back with
            tracing::warn!(url = %stored.url, error = %e, "Post insert failed after media was stored");
            Err(e.into())
        }
    }
}
