//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of the
//! `NoteRepository` and `AccountRepository` ports from the `core` crate. It handles
//! all interactions with the SQLite database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notes_core::domain::{Note, User, UserCredentials};
use notes_core::ports::{AccountRepository, NoteRepository, PortError, PortResult};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the storage ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: SqlitePool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct NoteRecord {
    id: Uuid,
    title: String,
    text: String,
    slug: String,
    author_id: Uuid,
    created_at: DateTime<Utc>,
}
impl NoteRecord {
    fn to_domain(self) -> Note {
        Note {
            id: self.id,
            title: self.title,
            text: self.text,
            slug: self.slug,
            author_id: self.author_id,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    username: String,
    hashed_password: String,
}
impl UserRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            username: self.username,
            hashed_password: self.hashed_password,
        }
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

//=========================================================================================
// `NoteRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl NoteRepository for DbAdapter {
    async fn insert_note(&self, note: &Note) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO notes (id, title, text, slug, author_id, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(note.id)
        .bind(&note.title)
        .bind(&note.text)
        .bind(&note.slug)
        .bind(note.author_id)
        .bind(note.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PortError::DuplicateSlug(note.slug.clone())
            } else {
                unexpected(e)
            }
        })?;
        Ok(())
    }

    async fn get_note_by_slug(&self, slug: &str) -> PortResult<Note> {
        let record = sqlx::query_as::<_, NoteRecord>(
            "SELECT id, title, text, slug, author_id, created_at FROM notes WHERE slug = ?",
        )
        .bind(slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Note '{}'", slug)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn list_notes_by_author(&self, author_id: Uuid) -> PortResult<Vec<Note>> {
        let records = sqlx::query_as::<_, NoteRecord>(
            "SELECT id, title, text, slug, author_id, created_at FROM notes WHERE author_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let notes = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(notes)
    }

    async fn update_note(&self, note: &Note) -> PortResult<()> {
        let result = sqlx::query("UPDATE notes SET title = ?, text = ?, slug = ? WHERE id = ?")
            .bind(&note.title)
            .bind(&note.text)
            .bind(&note.slug)
            .bind(note.id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    PortError::DuplicateSlug(note.slug.clone())
                } else {
                    unexpected(e)
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Note {}", note.id)));
        }
        Ok(())
    }

    async fn delete_note(&self, note_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(note_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Note {}", note_id)));
        }
        Ok(())
    }

    async fn count_notes(&self) -> PortResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notes")
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(count as u64)
    }
}

//=========================================================================================
// `AccountRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl AccountRepository for DbAdapter {
    async fn create_user(&self, username: &str, hashed_password: &str) -> PortResult<User> {
        let user_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO users (user_id, username, hashed_password, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(username)
        .bind(hashed_password)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PortError::DuplicateUsername(username.to_string())
            } else {
                unexpected(e)
            }
        })?;

        Ok(User {
            user_id,
            username: username.to_string(),
        })
    }

    async fn get_user_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, username, hashed_password FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {}", username)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let row = sqlx::query_as::<_, (Uuid, DateTime<Utc>)>(
            "SELECT user_id, expires_at FROM auth_sessions WHERE id = ?",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        match row {
            Some((user_id, expires_at)) if expires_at > Utc::now() => Ok(user_id),
            Some(_) => {
                debug!("Auth session expired, removing it");
                self.delete_auth_session(session_id).await?;
                Err(PortError::Unauthorized)
            }
            None => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
