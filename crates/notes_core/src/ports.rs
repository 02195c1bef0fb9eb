//! crates/notes_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Note, User, UserCredentials};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// A required field is empty or malformed.
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// Another note already uses this slug.
    #[error("Slug '{0}' is already taken")]
    DuplicateSlug(String),

    #[error("Username '{0}' is already taken")]
    DuplicateUsername(String),

    /// The item does not exist, or it belongs to someone other than the caller.
    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        PortError::Validation {
            field,
            message: message.into(),
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persistence for notes. Slug uniqueness must be enforced by the storage
/// itself: `insert_note` and `update_note` report a collision as
/// `PortError::DuplicateSlug`.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    async fn insert_note(&self, note: &Note) -> PortResult<()>;

    async fn get_note_by_slug(&self, slug: &str) -> PortResult<Note>;

    /// Notes of one author, oldest first.
    async fn list_notes_by_author(&self, author_id: Uuid) -> PortResult<Vec<Note>>;

    /// Overwrites title, text and slug of the note with `note.id`.
    async fn update_note(&self, note: &Note) -> PortResult<()>;

    async fn delete_note(&self, note_id: Uuid) -> PortResult<()>;

    async fn count_notes(&self) -> PortResult<u64>;
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn create_user(&self, username: &str, hashed_password: &str) -> PortResult<User>;

    async fn get_user_by_username(&self, username: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the owner of a live session. Unknown or expired sessions are
    /// `PortError::Unauthorized`.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}

/// Turns arbitrary text into a URL-safe slug.
///
/// Implementations must be idempotent: `slugify(slugify(s)) == slugify(s)`.
pub trait Slugifier: Send + Sync {
    fn slugify(&self, text: &str) -> String;
}
