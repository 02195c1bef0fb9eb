//! services/api/src/web/urls.rs
//!
//! Named routes. Route patterns are what the router mounts; the functions
//! build concrete paths for redirects and clients.

pub const HOME: &str = "/";
pub const LIST: &str = "/notes/";
pub const ADD: &str = "/add/";
pub const SUCCESS: &str = "/done/";
pub const DETAIL_ROUTE: &str = "/note/{slug}/";
pub const EDIT_ROUTE: &str = "/edit/{slug}/";
pub const DELETE_ROUTE: &str = "/delete/{slug}/";

pub const LOGIN: &str = "/auth/login/";
pub const LOGOUT: &str = "/auth/logout/";
pub const SIGNUP: &str = "/auth/signup/";

pub fn detail(slug: &str) -> String {
    format!("/note/{}/", slug)
}

pub fn edit(slug: &str) -> String {
    format!("/edit/{}/", slug)
}

pub fn delete(slug: &str) -> String {
    format!("/delete/{}/", slug)
}

/// The login page, asking to come back to `next` afterwards. Path
/// separators stay readable; everything else is percent-encoded.
pub fn login_with_next(next: &str) -> String {
    let encoded = urlencoding::encode(next).replace("%2F", "/");
    format!("{}?next={}", LOGIN, encoded)
}

/// Only same-site absolute paths are honoured as post-login targets.
pub fn is_safe_next(next: &str) -> bool {
    next.starts_with('/') && !next.starts_with("//") && !next.contains('\\')
}
