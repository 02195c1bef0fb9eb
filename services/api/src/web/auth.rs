//! services/api/src/web/auth.rs
//!
//! Authentication pages for signup, login, and logout.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Json, Response},
    Form,
};
use chrono::{Duration, Utc};
use notes_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::middleware::{found, session_id_from_headers, SESSION_COOKIE};
use crate::web::notes::{FormErrors, MessagePage};
use crate::web::{state::AppState, urls};

const USERNAME_MAX_LEN: usize = 150;
const PASSWORD_MIN_LEN: usize = 8;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NextParam {
    /// Where to go after logging in.
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CredentialsForm {
    pub username: String,
    pub password: String,
    /// Set by the login page from its own `next` query parameter.
    pub next: Option<String>,
}

/// The credentials form as echoed back to the page. Never carries the password.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct AccountForm {
    pub username: String,
    pub next: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountPage {
    pub form: AccountForm,
    pub errors: FormErrors,
}

fn account_page(username: String, next: Option<String>, errors: FormErrors) -> Response {
    Json(AccountPage {
        form: AccountForm { username, next },
        errors,
    })
    .into_response()
}

fn single_error(field: &str, message: impl Into<String>) -> FormErrors {
    let mut errors = FormErrors::new();
    errors.insert(field.to_string(), vec![message.into()]);
    errors
}

//=========================================================================================
// Helpers
//=========================================================================================

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, hashed: &str) -> Result<bool, ApiError> {
    let parsed_hash = PasswordHash::new(hashed)
        .map_err(|e| ApiError::Internal(format!("Failed to parse password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Usernames follow the usual `letters, digits and @/./+/-/_` rule.
fn validate_username(username: &str) -> Option<String> {
    if username.is_empty() {
        return Some("this field is required".to_string());
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Some(format!("must be at most {} characters", USERNAME_MAX_LEN));
    }
    let allowed = |c: char| c.is_alphanumeric() || "@.+-_".contains(c);
    if !username.chars().all(allowed) {
        return Some("may only contain letters, digits and @/./+/-/_".to_string());
    }
    None
}

/// Opens an auth session for `user_id` and returns the `Set-Cookie` value.
async fn start_session(state: &AppState, user_id: Uuid) -> Result<String, ApiError> {
    let auth_session_id = Uuid::new_v4().to_string();
    let ttl = Duration::days(state.config.session_ttl_days);

    state
        .accounts
        .create_auth_session(&auth_session_id, user_id, Utc::now() + ttl)
        .await?;

    Ok(format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        auth_session_id,
        ttl.num_seconds()
    ))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /auth/login/ - The login form.
#[utoipa::path(
    get,
    path = "/auth/login/",
    params(NextParam),
    responses((status = 200, description = "Login form", body = AccountPage))
)]
pub async fn login_page_handler(Query(params): Query<NextParam>) -> Response {
    account_page(String::new(), params.next, FormErrors::new())
}

/// POST /auth/login/ - Log in and go back to `next`.
#[utoipa::path(
    post,
    path = "/auth/login/",
    params(NextParam),
    request_body(content = CredentialsForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "Logged in, redirect to `next` or home"),
        (status = 200, description = "Invalid credentials, form comes back with errors", body = AccountPage)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NextParam>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, ApiError> {
    let next = form.next.or(params.next);

    // 1. Get user by username
    let user_creds = match state.accounts.get_user_by_username(&form.username).await {
        Ok(creds) => Some(creds),
        Err(PortError::NotFound(_)) => None,
        Err(e) => return Err(e.into()),
    };

    // 2. Verify password
    let user_creds = match user_creds {
        Some(creds) if verify_password(&form.password, &creds.hashed_password)? => creds,
        _ => {
            warn!("Failed login attempt for '{}'", form.username);
            return Ok(account_page(
                form.username,
                next,
                single_error("__all__", "invalid username or password"),
            ));
        }
    };

    // 3. Create auth session and cookie
    let cookie = start_session(&state, user_creds.user_id).await?;
    info!("User {} logged in", user_creds.user_id);

    let target = next
        .filter(|n| urls::is_safe_next(n))
        .unwrap_or_else(|| urls::HOME.to_string());
    Ok(([(header::SET_COOKIE, cookie)], found(&target)).into_response())
}

/// GET or POST /auth/logout/ - End the current session, if any.
#[utoipa::path(
    post,
    path = "/auth/logout/",
    responses((status = 200, description = "Logged out", body = MessagePage))
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(auth_session_id) = session_id_from_headers(&headers) {
        state
            .accounts
            .delete_auth_session(auth_session_id)
            .await
            .map_err(|e| {
                error!("Failed to delete auth session: {:?}", e);
                e
            })?;
    }

    let cookie = format!(
        "{}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE
    );
    let page = Json(MessagePage {
        message: "You have been logged out.".to_string(),
    });
    Ok(([(header::SET_COOKIE, cookie)], page).into_response())
}

/// GET /auth/signup/ - The signup form.
#[utoipa::path(
    get,
    path = "/auth/signup/",
    responses((status = 200, description = "Signup form", body = AccountPage))
)]
pub async fn signup_page_handler() -> Response {
    account_page(String::new(), None, FormErrors::new())
}

/// POST /auth/signup/ - Create a new user account.
#[utoipa::path(
    post,
    path = "/auth/signup/",
    request_body(content = CredentialsForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "User created, redirect to login"),
        (status = 200, description = "Rejected, form comes back with errors", body = AccountPage)
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, ApiError> {
    if let Some(message) = validate_username(&form.username) {
        return Ok(account_page(form.username, None, single_error("username", message)));
    }
    if form.password.chars().count() < PASSWORD_MIN_LEN {
        return Ok(account_page(
            form.username,
            None,
            single_error(
                "password",
                format!("must be at least {} characters", PASSWORD_MIN_LEN),
            ),
        ));
    }

    // 1. Hash the password
    let password_hash = hash_password(&form.password)?;

    // 2. Create user in database
    match state.accounts.create_user(&form.username, &password_hash).await {
        Ok(user) => {
            info!("Signed up user {} ({})", user.username, user.user_id);
            Ok(found(urls::LOGIN))
        }
        Err(PortError::DuplicateUsername(name)) => Ok(account_page(
            form.username,
            None,
            single_error("username", format!("'{}' is already taken", name)),
        )),
        Err(e) => Err(e.into()),
    }
}
