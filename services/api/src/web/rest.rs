//! services/api/src/web/rest.rs
//!
//! Assembles the router for every page and holds the master definition for
//! the OpenAPI specification.

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiError;
use crate::web::{auth, middleware::require_auth, notes, state::AppState, urls};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        notes::home_handler,
        notes::list_handler,
        notes::add_page_handler,
        notes::add_handler,
        notes::detail_handler,
        notes::edit_page_handler,
        notes::edit_handler,
        notes::delete_page_handler,
        notes::delete_handler,
        notes::success_handler,
        auth::login_page_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::signup_page_handler,
        auth::signup_handler,
    ),
    components(
        schemas(
            notes::NoteView,
            notes::NoteForm,
            notes::FormPage,
            notes::ListPage,
            notes::DetailPage,
            notes::MessagePage,
            auth::CredentialsForm,
            auth::AccountForm,
            auth::AccountPage,
        )
    ),
    tags(
        (name = "Notes API", description = "Personal notes, visible only to their author.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Router
//=========================================================================================

/// Builds the full application: note pages, account pages and Swagger UI.
pub fn build_router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = app_state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS origin: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route(urls::HOME, get(notes::home_handler))
        .route(
            urls::LOGIN,
            get(auth::login_page_handler).post(auth::login_handler),
        )
        .route(
            urls::LOGOUT,
            get(auth::logout_handler).post(auth::logout_handler),
        )
        .route(
            urls::SIGNUP,
            get(auth::signup_page_handler).post(auth::signup_handler),
        );

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route(urls::LIST, get(notes::list_handler))
        .route(
            urls::ADD,
            get(notes::add_page_handler).post(notes::add_handler),
        )
        .route(urls::DETAIL_ROUTE, get(notes::detail_handler))
        .route(
            urls::EDIT_ROUTE,
            get(notes::edit_page_handler).post(notes::edit_handler),
        )
        .route(
            urls::DELETE_ROUTE,
            get(notes::delete_page_handler)
                .post(notes::delete_handler)
                .delete(notes::delete_handler),
        )
        .route(urls::SUCCESS, get(notes::success_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}
