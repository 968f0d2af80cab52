use rusqlite::{params, ErrorCode, OptionalExtension, Row};

use crate::db::models::User;
use crate::db::{with_conn, DbError};
use crate::state::DbPool;

const USER_COLUMNS: &str =
    "id, email, password_hash, is_active, is_superuser, is_verified, created_at";

/// Column changes for one user. `None` leaves the column as it is.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_verified: Option<bool>,
}

#[derive(Debug)]
pub enum UpdateOutcome {
    Updated(User),
    NotFound,
    EmailTaken,
}

/// Data access for the users table.
#[derive(Clone)]
pub struct UserStore {
    pool: DbPool,
}

impl UserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new active, unverified user. Returns `None` if the email is taken.
    pub async fn create(&self, email: &str, password_hash: &str) -> Result<Option<User>, DbError> {
        let email = email.to_string();
        let password_hash = password_hash.to_string();
        with_conn(&self.pool, move |conn| {
            let id = uuid::Uuid::now_v7().to_string();
            let inserted = conn.execute(
                "INSERT INTO users (id, email, password_hash) VALUES (?1, ?2, ?3)",
                params![id, email, password_hash],
            );
            match inserted {
                Ok(_) => select_by_id(conn, &id),
                Err(e) if is_unique_violation(&e) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
    }

    pub async fn by_id(&self, id: &str) -> Result<Option<User>, DbError> {
        let id = id.to_string();
        with_conn(&self.pool, move |conn| select_by_id(conn, &id)).await
    }

    pub async fn by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let email = email.to_string();
        with_conn(&self.pool, move |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                user_from_row,
            )
            .optional()
        })
        .await
    }

    /// Apply `changes` in one transaction; nothing is written unless every column succeeds.
    pub async fn update(&self, id: &str, changes: UserChanges) -> Result<UpdateOutcome, DbError> {
        let id = id.to_string();
        with_conn(&self.pool, move |conn| {
            let tx = conn.unchecked_transaction()?;
            if select_by_id(&tx, &id)?.is_none() {
                return Ok(UpdateOutcome::NotFound);
            }

            if let Some(email) = changes.email {
                let updated = tx.execute(
                    "UPDATE users SET email = ?1 WHERE id = ?2",
                    params![email, id],
                );
                match updated {
                    Ok(_) => {}
                    Err(e) if is_unique_violation(&e) => return Ok(UpdateOutcome::EmailTaken),
                    Err(e) => return Err(e),
                }
            }
            if let Some(hash) = changes.password_hash {
                tx.execute(
                    "UPDATE users SET password_hash = ?1 WHERE id = ?2",
                    params![hash, id],
                )?;
            }
            let flags = [
                ("is_active", changes.is_active),
                ("is_superuser", changes.is_superuser),
                ("is_verified", changes.is_verified),
            ];
            for (column, value) in flags {
                if let Some(value) = value {
                    tx.execute(
                        &format!("UPDATE users SET {column} = ?1 WHERE id = ?2"),
                        params![value, id],
                    )?;
                }
            }

            let user = select_by_id(&tx, &id)?;
            tx.commit()?;
            Ok(match user {
                Some(user) => UpdateOutcome::Updated(user),
                None => UpdateOutcome::NotFound,
            })
        })
        .await
    }

    /// Remove a user. Their posts stay behind with no owner.
    pub async fn delete(&self, id: &str) -> Result<bool, DbError> {
        let id = id.to_string();
        with_conn(&self.pool, move |conn| {
            let rows = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
            Ok(rows > 0)
        })
        .await
    }
}

fn select_by_id(conn: &rusqlite::Connection, id: &str) -> Result<Option<User>, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id],
        user_from_row,
    )
    .optional()
}

fn user_from_row(row: &Row<'_>) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        is_active: row.get(3)?,
        is_superuser: row.get(4)?,
        is_verified: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use tempfile::TempDir;

    fn create_test_store() -> (UserStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = db::create_pool(&temp_dir.path().join("test.db")).unwrap();
        db::run_migrations(&pool).unwrap();
        (UserStore::new(pool), temp_dir)
    }

    #[tokio::test]
    async fn create_and_lookup() {
        let (store, _tmp) = create_test_store();
        let user = store.create("a@example.com", "hash").await.unwrap().unwrap();
        assert!(user.is_active);
        assert!(!user.is_superuser);
        assert!(!user.is_verified);

        let by_id = store.by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@example.com");
        let by_email = store.by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let (store, _tmp) = create_test_store();
        store.create("a@example.com", "hash").await.unwrap().unwrap();
        assert!(store.create("a@example.com", "other").await.unwrap().is_none());
    }

    fn updated(outcome: UpdateOutcome) -> User {
        match outcome {
            UpdateOutcome::Updated(user) => user,
            other => panic!("expected an update, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_changes_fields() {
        let (store, _tmp) = create_test_store();
        let user = store.create("a@example.com", "hash").await.unwrap().unwrap();

        let changes = UserChanges {
            email: Some("b@example.com".into()),
            password_hash: Some("new".into()),
            ..UserChanges::default()
        };
        let user_after = updated(store.update(&user.id, changes).await.unwrap());
        assert_eq!(user_after.email, "b@example.com");
        assert_eq!(user_after.password_hash, "new");
        assert_eq!(user_after.id, user.id);
        assert!(user_after.is_active);
    }

    #[tokio::test]
    async fn update_sets_flags() {
        let (store, _tmp) = create_test_store();
        let user = store.create("a@example.com", "hash").await.unwrap().unwrap();

        let changes = UserChanges {
            is_active: Some(false),
            is_superuser: Some(true),
            is_verified: Some(true),
            ..UserChanges::default()
        };
        let user = updated(store.update(&user.id, changes).await.unwrap());
        assert!(!user.is_active);
        assert!(user.is_superuser);
        assert!(user.is_verified);
        assert_eq!(user.password_hash, "hash");
    }

    #[tokio::test]
    async fn update_to_taken_email_writes_nothing() {
        let (store, _tmp) = create_test_store();
        store.create("a@example.com", "hash").await.unwrap().unwrap();
        let b = store.create("b@example.com", "hash").await.unwrap().unwrap();

        let changes = UserChanges {
            email: Some("a@example.com".into()),
            password_hash: Some("new".into()),
            is_superuser: Some(true),
            ..UserChanges::default()
        };
        let outcome = store.update(&b.id, changes).await.unwrap();
        assert!(matches!(outcome, UpdateOutcome::EmailTaken));

        let b = store.by_id(&b.id).await.unwrap().unwrap();
        assert_eq!(b.email, "b@example.com");
        assert_eq!(b.password_hash, "hash");
        assert!(!b.is_superuser);
    }

    #[tokio::test]
    async fn update_of_missing_user_is_not_found() {
        let (store, _tmp) = create_test_store();
        let changes = UserChanges {
            email: Some("a@example.com".into()),
            ..UserChanges::default()
        };
        let outcome = store.update("ghost", changes).await.unwrap();
        assert!(matches!(outcome, UpdateOutcome::NotFound));
        assert!(store.by_email("a@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_reports_whether_removed() {
        let (store, _tmp) = create_test_store();
        let user = store.create("a@example.com", "hash").await.unwrap().unwrap();
        assert!(store.delete(&user.id).await.unwrap());
        assert!(!store.delete(&user.id).await.unwrap());
        assert!(store.by_id(&user.id).await.unwrap().is_none());
    }
}
