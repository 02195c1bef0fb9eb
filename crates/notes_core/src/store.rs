//! crates/notes_core/src/store.rs
//!
//! The note store: creation with slug assignment, and every read or write
//! gated on the caller being the note's author.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Note, NoteChanges, SLUG_MAX_LEN, TITLE_MAX_LEN};
use crate::ports::{NoteRepository, PortError, PortResult, Slugifier};
use crate::slug::{is_valid_slug, truncate_slug};

/// Owner-scoped access to notes.
///
/// Callers pass the authenticated user's id into every operation. A note that
/// belongs to someone else is reported as `PortError::NotFound`, exactly like
/// a note that does not exist.
#[derive(Clone)]
pub struct NoteStore {
    repo: Arc<dyn NoteRepository>,
    slugifier: Arc<dyn Slugifier>,
}

impl NoteStore {
    pub fn new(repo: Arc<dyn NoteRepository>, slugifier: Arc<dyn Slugifier>) -> Self {
        Self { repo, slugifier }
    }

    /// Creates a note. An empty `slug` is derived from the title.
    ///
    /// A slug collision rejects the whole creation; nothing is stored and the
    /// slug is never adjusted to make room.
    pub async fn create(
        &self,
        author_id: Uuid,
        title: &str,
        text: &str,
        slug: &str,
    ) -> PortResult<Note> {
        validate_title(title)?;
        validate_text(text)?;
        let slug = self.resolve_slug(title, slug)?;

        let note = Note {
            id: Uuid::new_v4(),
            title: title.to_string(),
            text: text.to_string(),
            slug,
            author_id,
            created_at: Utc::now(),
        };
        self.repo.insert_note(&note).await?;

        info!("User {} created note '{}'", author_id, note.slug);
        Ok(note)
    }

    pub async fn list_for(&self, author_id: Uuid) -> PortResult<Vec<Note>> {
        self.repo.list_notes_by_author(author_id).await
    }

    pub async fn get_by_slug_for(&self, author_id: Uuid, slug: &str) -> PortResult<Note> {
        let note = match self.repo.get_note_by_slug(slug).await {
            Ok(note) => note,
            Err(PortError::NotFound(_)) => return Err(not_found(slug)),
            Err(e) => return Err(e),
        };

        if note.author_id != author_id {
            warn!("User {} asked for note '{}' owned by someone else", author_id, slug);
            return Err(not_found(slug));
        }
        Ok(note)
    }

    /// Applies the supplied fields to the caller's note.
    pub async fn edit(
        &self,
        author_id: Uuid,
        slug: &str,
        changes: NoteChanges,
    ) -> PortResult<Note> {
        let mut note = self.get_by_slug_for(author_id, slug).await?;

        if let Some(title) = changes.title {
            validate_title(&title)?;
            note.title = title;
        }
        if let Some(text) = changes.text {
            validate_text(&text)?;
            note.text = text;
        }
        if let Some(new_slug) = changes.slug {
            note.slug = self.resolve_slug(&note.title, &new_slug)?;
        }

        self.repo.update_note(&note).await?;
        info!("User {} edited note '{}'", author_id, note.slug);
        Ok(note)
    }

    pub async fn delete(&self, author_id: Uuid, slug: &str) -> PortResult<()> {
        let note = self.get_by_slug_for(author_id, slug).await?;
        match self.repo.delete_note(note.id).await {
            Ok(()) => {}
            // Lost a race with another delete of the same note.
            Err(PortError::NotFound(_)) => return Err(not_found(slug)),
            Err(e) => return Err(e),
        }
        info!("User {} deleted note '{}'", author_id, slug);
        Ok(())
    }

    /// Checks a supplied slug, or derives one from the title when it is empty.
    fn resolve_slug(&self, title: &str, slug: &str) -> PortResult<String> {
        let slug = slug.trim();
        if slug.is_empty() {
            let derived = truncate_slug(&self.slugifier.slugify(title));
            if derived.is_empty() {
                return Err(PortError::validation(
                    "slug",
                    "cannot derive a slug from this title, please provide one",
                ));
            }
            return Ok(derived);
        }

        if slug.chars().count() > SLUG_MAX_LEN {
            return Err(PortError::validation(
                "slug",
                format!("must be at most {} characters", SLUG_MAX_LEN),
            ));
        }
        if !is_valid_slug(slug) {
            return Err(PortError::validation(
                "slug",
                "may only contain Latin letters, digits, underscores and hyphens",
            ));
        }
        Ok(slug.to_string())
    }
}

fn not_found(slug: &str) -> PortError {
    PortError::NotFound(format!("Note '{}'", slug))
}

fn validate_title(title: &str) -> PortResult<()> {
    if title.trim().is_empty() {
        return Err(PortError::validation("title", "this field is required"));
    }
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(PortError::validation(
            "title",
            format!("must be at most {} characters", TITLE_MAX_LEN),
        ));
    }
    Ok(())
}

fn validate_text(text: &str) -> PortResult<()> {
    if text.trim().is_empty() {
        return Err(PortError::validation("text", "this field is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slug::TranslitSlugifier;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Keeps notes keyed by slug, which gives the same uniqueness guarantee
    /// as the database constraint.
    #[derive(Default)]
    struct MemoryNotes {
        notes: Mutex<HashMap<String, Note>>,
    }

    #[async_trait]
    impl NoteRepository for MemoryNotes {
        async fn insert_note(&self, note: &Note) -> PortResult<()> {
            let mut notes = self.notes.lock().unwrap();
            if notes.contains_key(&note.slug) {
                return Err(PortError::DuplicateSlug(note.slug.clone()));
            }
            notes.insert(note.slug.clone(), note.clone());
            Ok(())
        }

        async fn get_note_by_slug(&self, slug: &str) -> PortResult<Note> {
            self.notes
                .lock()
                .unwrap()
                .get(slug)
                .cloned()
                .ok_or_else(|| PortError::NotFound(slug.to_string()))
        }

        async fn list_notes_by_author(&self, author_id: Uuid) -> PortResult<Vec<Note>> {
            let mut notes: Vec<Note> = self
                .notes
                .lock()
                .unwrap()
                .values()
                .filter(|n| n.author_id == author_id)
                .cloned()
                .collect();
            notes.sort_by_key(|n| (n.created_at, n.id));
            Ok(notes)
        }

        async fn update_note(&self, note: &Note) -> PortResult<()> {
            let mut notes = self.notes.lock().unwrap();
            if let Some(other) = notes.get(&note.slug) {
                if other.id != note.id {
                    return Err(PortError::DuplicateSlug(note.slug.clone()));
                }
            }
            notes.retain(|_, n| n.id != note.id);
            notes.insert(note.slug.clone(), note.clone());
            Ok(())
        }

        async fn delete_note(&self, note_id: Uuid) -> PortResult<()> {
            let mut notes = self.notes.lock().unwrap();
            let before = notes.len();
            notes.retain(|_, n| n.id != note_id);
            if notes.len() == before {
                return Err(PortError::NotFound(note_id.to_string()));
            }
            Ok(())
        }

        async fn count_notes(&self) -> PortResult<u64> {
            Ok(self.notes.lock().unwrap().len() as u64)
        }
    }

    fn store() -> (NoteStore, Arc<MemoryNotes>) {
        let repo = Arc::new(MemoryNotes::default());
        let store = NoteStore::new(repo.clone(), Arc::new(TranslitSlugifier));
        (store, repo)
    }

    #[tokio::test]
    async fn empty_slug_is_derived_from_title() {
        let (store, _) = store();
        let author = Uuid::new_v4();

        let note = store.create(author, "Заголовок", "Текст", "").await.unwrap();

        assert_eq!(note.slug, "zagolovok");
        assert_eq!(TranslitSlugifier.slugify(&note.slug), note.slug);
    }

    #[tokio::test]
    async fn repeated_create_with_same_derived_slug_is_rejected() {
        let (store, repo) = store();
        let author = Uuid::new_v4();

        store.create(author, "Заголовок", "Текст", "").await.unwrap();
        let err = store.create(author, "Заголовок", "Текст", "").await.unwrap_err();

        assert!(matches!(err, PortError::DuplicateSlug(ref s) if s == "zagolovok"));
        assert_eq!(repo.count_notes().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn explicit_slug_collides_across_authors() {
        let (store, repo) = store();

        store.create(Uuid::new_v4(), "One", "Text", "shared").await.unwrap();
        let err = store
            .create(Uuid::new_v4(), "Two", "Text", "shared")
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::DuplicateSlug(_)));
        assert_eq!(repo.count_notes().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_fields_fail_validation() {
        let (store, repo) = store();
        let author = Uuid::new_v4();

        let err = store.create(author, "  ", "Text", "").await.unwrap_err();
        assert!(matches!(err, PortError::Validation { field: "title", .. }));

        let err = store.create(author, "Title", "", "").await.unwrap_err();
        assert!(matches!(err, PortError::Validation { field: "text", .. }));

        let err = store.create(author, "!!!", "Text", "").await.unwrap_err();
        assert!(matches!(err, PortError::Validation { field: "slug", .. }));

        let err = store.create(author, "Title", "Text", "bad slug").await.unwrap_err();
        assert!(matches!(err, PortError::Validation { field: "slug", .. }));

        assert_eq!(repo.count_notes().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn overlong_title_and_slug_are_rejected() {
        let (store, repo) = store();
        let author = Uuid::new_v4();

        let long_title = "t".repeat(TITLE_MAX_LEN + 1);
        let err = store.create(author, &long_title, "Text", "ok").await.unwrap_err();
        assert!(matches!(err, PortError::Validation { field: "title", .. }));

        let long_slug = "s".repeat(SLUG_MAX_LEN + 1);
        let err = store.create(author, "Title", "Text", &long_slug).await.unwrap_err();
        assert!(matches!(err, PortError::Validation { field: "slug", .. }));

        assert_eq!(repo.count_notes().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn limits_count_characters_not_bytes() {
        let (store, repo) = store();
        let author = Uuid::new_v4();

        // Two bytes per letter in UTF-8, so well over the limit in bytes.
        let cyrillic_title = "ж".repeat(TITLE_MAX_LEN);
        let note = store
            .create(author, &cyrillic_title, "Text", "cyrillic")
            .await
            .unwrap();
        assert_eq!(note.title.chars().count(), TITLE_MAX_LEN);

        let exact_slug = "s".repeat(SLUG_MAX_LEN);
        let note = store
            .create(author, &"t".repeat(TITLE_MAX_LEN), "Text", &exact_slug)
            .await
            .unwrap();
        assert_eq!(note.slug, exact_slug);

        let err = store
            .create(author, &"ж".repeat(TITLE_MAX_LEN + 1), "Text", "too-long")
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Validation { field: "title", .. }));
        assert_eq!(repo.count_notes().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn derived_slug_of_long_cyrillic_title_fits_the_limit() {
        let (store, _) = store();

        // "ж" spells "zh", so the derived slug is twice the limit before cutting.
        let note = store
            .create(Uuid::new_v4(), &"ж".repeat(TITLE_MAX_LEN), "Text", "")
            .await
            .unwrap();
        assert_eq!(note.slug.chars().count(), SLUG_MAX_LEN);
    }

    #[tokio::test]
    async fn list_contains_only_own_notes() {
        let (store, _) = store();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        let mine = store.create(alice, "Mine", "Text", "").await.unwrap();
        let theirs = store.create(bob, "Theirs", "Text", "").await.unwrap();

        let listed = store.list_for(alice).await.unwrap();
        assert_eq!(listed, vec![mine]);
        assert!(!listed.contains(&theirs));
    }

    #[tokio::test]
    async fn foreign_note_looks_missing() {
        let (store, repo) = store();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let note = store.create(alice, "Private", "Text", "").await.unwrap();

        let foreign = store.get_by_slug_for(bob, &note.slug).await.unwrap_err();
        let missing = store.get_by_slug_for(bob, "no-such-note").await.unwrap_err();
        assert!(matches!(foreign, PortError::NotFound(_)));
        assert!(matches!(missing, PortError::NotFound(_)));

        let changes = NoteChanges {
            title: Some("Hijacked".into()),
            ..Default::default()
        };
        assert!(matches!(
            store.edit(bob, &note.slug, changes).await,
            Err(PortError::NotFound(_))
        ));
        assert!(matches!(
            store.delete(bob, &note.slug).await,
            Err(PortError::NotFound(_))
        ));

        let stored = store.get_by_slug_for(alice, &note.slug).await.unwrap();
        assert_eq!(stored.title, "Private");
        assert_eq!(repo.count_notes().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn edit_applies_only_supplied_fields() {
        let (store, _) = store();
        let author = Uuid::new_v4();
        let note = store.create(author, "Title", "Old text", "my-note").await.unwrap();

        let changes = NoteChanges {
            text: Some("New text".into()),
            ..Default::default()
        };
        let edited = store.edit(author, &note.slug, changes).await.unwrap();

        assert_eq!(edited.title, "Title");
        assert_eq!(edited.text, "New text");
        assert_eq!(edited.slug, "my-note");
        assert_eq!(edited.author_id, author);
        assert_eq!(edited.created_at, note.created_at);
    }

    #[tokio::test]
    async fn edit_keeps_slugs_unique() {
        let (store, _) = store();
        let author = Uuid::new_v4();
        store.create(author, "First", "Text", "first").await.unwrap();
        store.create(author, "Second", "Text", "second").await.unwrap();

        let changes = NoteChanges {
            slug: Some("first".into()),
            ..Default::default()
        };
        let err = store.edit(author, "second", changes).await.unwrap_err();
        assert!(matches!(err, PortError::DuplicateSlug(_)));
        assert!(store.get_by_slug_for(author, "second").await.is_ok());
    }

    #[tokio::test]
    async fn edit_with_empty_slug_rederives_from_title() {
        let (store, _) = store();
        let author = Uuid::new_v4();
        store.create(author, "Title", "Text", "custom").await.unwrap();

        let changes = NoteChanges {
            title: Some("Новый заголовок".into()),
            slug: Some(String::new()),
            ..Default::default()
        };
        let edited = store.edit(author, "custom", changes).await.unwrap();
        assert_eq!(edited.slug, "novyj-zagolovok");
        assert!(store.get_by_slug_for(author, "custom").await.is_err());
    }

    #[tokio::test]
    async fn second_delete_reports_not_found() {
        let (store, repo) = store();
        let author = Uuid::new_v4();
        let note = store.create(author, "Title", "Text", "").await.unwrap();

        store.delete(author, &note.slug).await.unwrap();
        assert_eq!(repo.count_notes().await.unwrap(), 0);
        assert!(matches!(
            store.delete(author, &note.slug).await,
            Err(PortError::NotFound(_))
        ));
    }
}
