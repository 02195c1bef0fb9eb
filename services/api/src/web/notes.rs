//! services/api/src/web/notes.rs
//!
//! Handlers for the note pages. Each page answers with its context as JSON:
//! `object_list` for the list, `object` for a single note and `form` for the
//! add and edit pages.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
    Extension, Form,
};
use chrono::{DateTime, Utc};
use notes_core::domain::{Note, NoteChanges};
use notes_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::{middleware::found, state::AppState, urls};

//=========================================================================================
// Page Payloads
//=========================================================================================

/// A note as shown to its author.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NoteView {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub slug: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Note> for NoteView {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            text: note.text,
            slug: note.slug,
            author_id: note.author_id,
            created_at: note.created_at,
        }
    }
}

/// The fields of the add and edit forms. Missing fields read as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct NoteForm {
    pub title: String,
    pub text: String,
    pub slug: String,
}

impl From<&Note> for NoteForm {
    fn from(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            text: note.text.clone(),
            slug: note.slug.clone(),
        }
    }
}

/// Field name to error messages.
pub type FormErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FormPage {
    pub form: NoteForm,
    pub errors: FormErrors,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListPage {
    pub object_list: Vec<NoteView>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DetailPage {
    pub object: NoteView,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessagePage {
    pub message: String,
}

/// Turns a rejected submission into form errors, or passes anything else on.
fn form_errors(err: PortError) -> Result<FormErrors, ApiError> {
    let (field, message) = match err {
        PortError::Validation { field, message } => (field, message),
        PortError::DuplicateSlug(slug) => (
            "slug",
            format!("'{}' is already taken, please choose a unique slug", slug),
        ),
        other => return Err(other.into()),
    };
    let mut errors = FormErrors::new();
    errors.insert(field.to_string(), vec![message]);
    Ok(errors)
}

fn form_page(form: NoteForm, errors: FormErrors) -> Response {
    Json(FormPage { form, errors }).into_response()
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET / - Landing page, open to everyone.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Landing page", body = MessagePage))
)]
pub async fn home_handler() -> Json<MessagePage> {
    Json(MessagePage {
        message: "Personal notes. Log in to see yours.".to_string(),
    })
}

/// GET /notes/ - The caller's notes.
#[utoipa::path(
    get,
    path = "/notes/",
    responses(
        (status = 200, description = "Notes of the logged-in user", body = ListPage),
        (status = 302, description = "Not logged in, redirect to login")
    )
)]
pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<ListPage>, ApiError> {
    let notes = state.notes.list_for(user_id).await?;
    Ok(Json(ListPage {
        object_list: notes.into_iter().map(NoteView::from).collect(),
    }))
}

/// GET /add/ - An empty note form.
#[utoipa::path(
    get,
    path = "/add/",
    responses(
        (status = 200, description = "Empty note form", body = FormPage),
        (status = 302, description = "Not logged in, redirect to login")
    )
)]
pub async fn add_page_handler() -> Response {
    form_page(NoteForm::default(), FormErrors::new())
}

/// POST /add/ - Create a note. An empty slug is derived from the title.
#[utoipa::path(
    post,
    path = "/add/",
    request_body(content = NoteForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Created, redirect to the success page"),
        (status = 200, description = "Rejected, the form comes back with errors", body = FormPage)
    )
)]
pub async fn add_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Form(form): Form<NoteForm>,
) -> Result<Response, ApiError> {
    match state
        .notes
        .create(user_id, &form.title, &form.text, &form.slug)
        .await
    {
        Ok(_) => Ok(found(urls::SUCCESS)),
        Err(e) => {
            info!("Rejected new note from user {}: {}", user_id, e);
            Ok(form_page(form, form_errors(e)?))
        }
    }
}

/// GET /note/{slug}/ - One of the caller's notes.
#[utoipa::path(
    get,
    path = "/note/{slug}/",
    params(("slug" = String, Path, description = "Slug of the note")),
    responses(
        (status = 200, description = "The note", body = DetailPage),
        (status = 404, description = "No such note, or it belongs to someone else")
    )
)]
pub async fn detail_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(slug): Path<String>,
) -> Result<Json<DetailPage>, ApiError> {
    let note = state.notes.get_by_slug_for(user_id, &slug).await?;
    Ok(Json(DetailPage {
        object: note.into(),
    }))
}

/// GET /edit/{slug}/ - The note form, filled in.
#[utoipa::path(
    get,
    path = "/edit/{slug}/",
    params(("slug" = String, Path, description = "Slug of the note")),
    responses(
        (status = 200, description = "Filled-in note form", body = FormPage),
        (status = 404, description = "No such note, or it belongs to someone else")
    )
)]
pub async fn edit_page_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let note = state.notes.get_by_slug_for(user_id, &slug).await?;
    Ok(form_page(NoteForm::from(&note), FormErrors::new()))
}

/// POST /edit/{slug}/ - Save the note form.
#[utoipa::path(
    post,
    path = "/edit/{slug}/",
    params(("slug" = String, Path, description = "Slug of the note")),
    request_body(content = NoteForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Saved, redirect to the success page"),
        (status = 200, description = "Rejected, the form comes back with errors", body = FormPage),
        (status = 404, description = "No such note, or it belongs to someone else")
    )
)]
pub async fn edit_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(slug): Path<String>,
    Form(form): Form<NoteForm>,
) -> Result<Response, ApiError> {
    // The form always submits every field, as the add form does.
    let changes = NoteChanges {
        title: Some(form.title.clone()),
        text: Some(form.text.clone()),
        slug: Some(form.slug.clone()),
    };
    match state.notes.edit(user_id, &slug, changes).await {
        Ok(_) => Ok(found(urls::SUCCESS)),
        Err(e @ PortError::NotFound(_)) => Err(e.into()),
        Err(e) => {
            info!("Rejected edit of '{}' by user {}: {}", slug, user_id, e);
            Ok(form_page(form, form_errors(e)?))
        }
    }
}

/// GET /delete/{slug}/ - Confirmation page for deleting a note.
#[utoipa::path(
    get,
    path = "/delete/{slug}/",
    params(("slug" = String, Path, description = "Slug of the note")),
    responses(
        (status = 200, description = "The note about to be deleted", body = DetailPage),
        (status = 404, description = "No such note, or it belongs to someone else")
    )
)]
pub async fn delete_page_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(slug): Path<String>,
) -> Result<Json<DetailPage>, ApiError> {
    let note = state.notes.get_by_slug_for(user_id, &slug).await?;
    Ok(Json(DetailPage {
        object: note.into(),
    }))
}

/// POST or DELETE /delete/{slug}/ - Delete a note.
#[utoipa::path(
    delete,
    path = "/delete/{slug}/",
    params(("slug" = String, Path, description = "Slug of the note")),
    responses(
        (status = 302, description = "Deleted, redirect to the success page"),
        (status = 404, description = "No such note, or it belongs to someone else")
    )
)]
pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    state.notes.delete(user_id, &slug).await?;
    Ok(found(urls::SUCCESS))
}

/// GET /done/ - Shown after a successful add, edit or delete.
#[utoipa::path(
    get,
    path = "/done/",
    responses(
        (status = 200, description = "Success page", body = MessagePage),
        (status = 302, description = "Not logged in, redirect to login")
    )
)]
pub async fn success_handler() -> Json<MessagePage> {
    Json(MessagePage {
        message: "Done.".to_string(),
    })
}
