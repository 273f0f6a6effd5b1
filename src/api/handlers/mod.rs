//! HTTP handlers.

mod health;
mod identity;
mod merge;
mod notes;

pub use health::{HealthResponse, health_check};
pub use identity::get_identity;
pub use merge::merge_guest_data;
pub use notes::{CreateNoteRequest, archive_note, create_note, list_notes};

use axum_extra::extract::cookie::CookieJar;

use crate::api::cookies::guest_token;
use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::application::resolve_owner;
use crate::domain::{AuthenticatedUser, OwnerIdentity};
use crate::infrastructure::{MergeBackend, NoteRepository, SessionDirectory, StorageError};

/// The user behind the request's session cookie, if the session is live.
async fn current_user<Store, Sessions>(
    state: &AppState<Store, Sessions>,
    jar: &CookieJar,
) -> Result<Option<AuthenticatedUser>, StorageError>
where
    Store: MergeBackend + NoteRepository,
    Sessions: SessionDirectory,
{
    match state.cookies.session_cookie(jar) {
        Some(session_token) => state.sessions.lookup(&session_token).await,
        None => Ok(None),
    }
}

/// Resolves the owner of the request.
async fn current_owner<Store, Sessions>(
    state: &AppState<Store, Sessions>,
    jar: &CookieJar,
) -> Result<OwnerIdentity, ApiError>
where
    Store: MergeBackend + NoteRepository,
    Sessions: SessionDirectory,
{
    let user = current_user(state, jar).await?;
    Ok(resolve_owner(user.as_ref(), guest_token(jar).as_ref())?)
}
