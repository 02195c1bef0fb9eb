//! crates/notes_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Longest title a note may carry, in characters.
pub const TITLE_MAX_LEN: usize = 100;

/// Longest slug a note may carry, in characters. Derived slugs are cut to fit.
pub const SLUG_MAX_LEN: usize = 100;

/// A personal text note. `slug` is unique across every author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub slug: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Field updates for an existing note. `None` leaves the field untouched.
///
/// An empty `slug` asks for a fresh slug derived from the resulting title,
/// the same rule that applies on creation.
#[derive(Debug, Clone, Default)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub text: Option<String>,
    pub slug: Option<String>,
}

// Represents a user - used throughout app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: Uuid,
    pub username: String,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub username: String,
    pub hashed_password: String,
}
