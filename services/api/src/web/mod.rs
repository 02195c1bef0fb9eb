pub mod auth;
pub mod middleware;
pub mod notes;
pub mod rest;
pub mod state;
pub mod urls;

// Re-export what the binaries need to assemble the server.
pub use middleware::require_auth;
pub use rest::{build_router, ApiDoc};
pub use state::AppState;
