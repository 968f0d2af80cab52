use rusqlite::types::Type;
use rusqlite::{params, Row};

use crate::db::models::{FileType, NewPost, Post, PostWithAuthor};
use crate::db::{with_conn, DbError};
use crate::state::DbPool;

const POST_COLUMNS: &str = "p.id, p.user_id, p.caption, p.url, p.file_type, p.file_name, p.created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    NotOwner,
}

/// Data access for the posts table.
#[derive(Clone)]
pub struct PostStore {
    pool: DbPool,
}

impl PostStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: NewPost) -> Result<Post, DbError> {
        with_conn(&self.pool, move |conn| {
            let id = uuid::Uuid::now_v7().to_string();
            let created_at: String = conn.query_row(
                "INSERT INTO posts (id, user_id, caption, url, file_type, file_name)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 RETURNING created_at",
                params![
                    id,
                    new.user_id,
                    new.caption,
                    new.url,
                    new.file_type.as_str(),
                    new.file_name
                ],
                |row| row.get(0),
            )?;

            Ok(Post {
                id,
                user_id: Some(new.user_id),
                caption: new.caption,
                url: new.url,
                file_type: new.file_type,
                file_name: new.file_name,
                created_at,
            })
        })
        .await
    }

    /// Every post, newest first. Equal timestamps fall back to id, which is time-ordered.
    pub async fn feed(&self) -> Result<Vec<PostWithAuthor>, DbError> {
        with_conn(&self.pool, |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {POST_COLUMNS}, u.email
                 FROM posts p
                 LEFT JOIN users u ON u.id = p.user_id
                 ORDER BY p.created_at DESC, p.id DESC"
            ))?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(PostWithAuthor {
                        post: post_from_row(row)?,
                        author_email: row.get(7)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }

    #[cfg(test)]
    pub async fn find(&self, id: &str) -> Result<Option<Post>, DbError> {
        use rusqlite::OptionalExtension;

        let id = id.to_string();
        with_conn(&self.pool, move |conn| {
            conn.query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.id = ?1"),
                params![id],
                post_from_row,
            )
            .optional()
        })
        .await
    }

    /// Delete a post only if `owner_id` owns it. A post with no owner is never deleted.
    pub async fn delete_owned(&self, id: &str, owner_id: &str) -> Result<DeleteOutcome, DbError> {
        let id = id.to_string();
        let owner_id = owner_id.to_string();
        with_conn(&self.pool, move |conn| {
            let removed = conn.execute(
                "DELETE FROM posts WHERE id = ?1 AND user_id = ?2",
                params![id, owner_id],
            )?;
            if removed > 0 {
                return Ok(DeleteOutcome::Deleted);
            }

            let exists: bool = conn.query_row(
                "SELECT COUNT(*) > 0 FROM posts WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )?;
            Ok(if exists {
                DeleteOutcome::NotOwner
            } else {
                DeleteOutcome::NotFound
            })
        })
        .await
    }
}

fn post_from_row(row: &Row<'_>) -> Result<Post, rusqlite::Error> {
    let file_type: String = row.get(4)?;
    let file_type = FileType::parse(&file_type).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            Type::Text,
            format!("unknown file_type {file_type:?}").into(),
        )
    })?;

    Ok(Post {
        id: row.get(0)?,
        user_id: row.get(1)?,
        caption: row.get(2)?,
        url: row.get(3)?,
        file_type,
        file_name: row.get(5)?,
        created_at: row.get(6)?,
    })
}
