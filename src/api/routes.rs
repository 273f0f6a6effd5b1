//! Routing definitions.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::api::handlers;
use crate::api::middleware::GuestTokenLayer;
use crate::api::state::AppState;
use crate::infrastructure::{MergeBackend, NoteRepository, SessionDirectory};

// =============================================================================
// Router Creation
// =============================================================================

/// Creates the router with every route and middleware.
///
/// The guest token layer wraps every route, so handlers always see either a
/// session cookie or a guest cookie.
///
/// # Examples
///
/// ```ignore
/// use guest_merge::api::{AppState, CookieSettings, create_router};
/// use guest_merge::infrastructure::{InMemorySessionDirectory, InMemoryStore};
///
/// let state = AppState::new(
///     InMemoryStore::new(),
///     InMemorySessionDirectory::new(),
///     CookieSettings::default(),
/// );
/// let router = create_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
/// axum::serve(listener, router).await?;
/// ```
pub fn create_router<Store, Sessions>(state: AppState<Store, Sessions>) -> Router
where
    Store: MergeBackend + NoteRepository,
    Sessions: SessionDirectory,
{
    let guest_tokens = GuestTokenLayer::new(Arc::clone(&state.cookies));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/identity", get(handlers::get_identity::<Store, Sessions>))
        .route(
            "/notes",
            post(handlers::create_note::<Store, Sessions>)
                .get(handlers::list_notes::<Store, Sessions>),
        )
        .route(
            "/notes/{note_id}/archive",
            post(handlers::archive_note::<Store, Sessions>),
        )
        .route("/merge", post(handlers::merge_guest_data::<Store, Sessions>))
        .layer(guest_tokens)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
