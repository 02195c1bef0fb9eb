#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, Response},
    Router,
};
use chrono::{Duration, Utc};
use notes_api::{
    adapters::DbAdapter,
    config::Config,
    web::{build_router, AppState},
};
use notes_core::ports::{AccountRepository, NoteRepository};
use notes_core::{Note, TranslitSlugifier};
use serde::de::DeserializeOwned;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

/// A fully wired application on top of a private in-memory database.
pub struct TestApp {
    pub router: Router,
    pub db: Arc<DbAdapter>,
    pub pool: SqlitePool,
}

/// A user with a live session cookie.
pub struct TestUser {
    pub user_id: Uuid,
    pub cookie: String,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        // One connection that never expires, so the in-memory database lives
        // as long as the pool.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;
        let db = Arc::new(DbAdapter::new(pool.clone()));
        db.run_migrations().await?;

        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("sqlite::memory:".to_string()),
            _ => None,
        })?;
        let state = Arc::new(AppState::new(
            db.clone(),
            Arc::new(TranslitSlugifier),
            Arc::new(config),
        ));
        let router = build_router(state)?;

        Ok(Self { router, db, pool })
    }

    /// Creates a user and logs them in without going through password hashing.
    pub async fn login_as(&self, username: &str) -> Result<TestUser> {
        let user = self.db.create_user(username, "not-a-real-hash").await?;
        let session_id = Uuid::new_v4().to_string();
        self.db
            .create_auth_session(&session_id, user.user_id, Utc::now() + Duration::days(1))
            .await?;
        Ok(TestUser {
            user_id: user.user_id,
            cookie: format!("session={}", session_id),
        })
    }

    /// Stores a note directly, bypassing the pages.
    pub async fn create_note(&self, author: &TestUser, title: &str, text: &str, slug: &str) -> Result<Note> {
        let note = Note {
            id: Uuid::new_v4(),
            title: title.to_string(),
            text: text.to_string(),
            slug: slug.to_string(),
            author_id: author.user_id,
            created_at: Utc::now(),
        };
        self.db.insert_note(&note).await?;
        Ok(note)
    }

    pub async fn note_count(&self) -> Result<u64> {
        Ok(self.db.count_notes().await?)
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<&TestUser>,
        form: Option<&[(&str, &str)]>,
    ) -> Result<Response<Body>> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::COOKIE, &user.cookie);
        }
        let body = match form {
            Some(fields) => {
                builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form_body(fields))
            }
            None => Body::empty(),
        };
        let response = self.router.clone().oneshot(builder.body(body)?).await?;
        Ok(response)
    }

    pub async fn get(&self, uri: &str, user: Option<&TestUser>) -> Result<Response<Body>> {
        self.send(Method::GET, uri, user, None).await
    }

    pub async fn post(&self, uri: &str, user: Option<&TestUser>, form: &[(&str, &str)]) -> Result<Response<Body>> {
        self.send(Method::POST, uri, user, Some(form)).await
    }

    pub async fn delete(&self, uri: &str, user: Option<&TestUser>) -> Result<Response<Body>> {
        self.send(Method::DELETE, uri, user, None).await
    }
}

pub fn form_body(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

pub async fn body_json<T: DeserializeOwned>(response: Response<Body>) -> Result<T> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    serde_json::from_slice(&bytes).context("Response body is not the expected JSON")
}

pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// The `name=value` part of the response's `Set-Cookie` header.
pub fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}
