//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use notes_core::ports::{AccountRepository, NoteRepository, Slugifier};
use notes_core::NoteStore;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountRepository>,
    pub notes: NoteStore,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new<D>(db: Arc<D>, slugifier: Arc<dyn Slugifier>, config: Arc<Config>) -> Self
    where
        D: AccountRepository + NoteRepository + 'static,
    {
        let notes_repo: Arc<dyn NoteRepository> = db.clone();
        Self {
            accounts: db,
            notes: NoteStore::new(notes_repo, slugifier),
            config,
        }
    }
}
