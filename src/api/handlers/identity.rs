use axum::Json;
use axum::extract::State;
use axum_extra::extract::cookie::CookieJar;

use super::current_owner;
use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::domain::OwnerIdentity;
use crate::infrastructure::{MergeBackend, NoteRepository, SessionDirectory};

/// Reports who owns the current request.
pub async fn get_identity<Store, Sessions>(
    State(state): State<AppState<Store, Sessions>>,
    jar: CookieJar,
) -> Result<Json<OwnerIdentity>, ApiError>
where
    Store: MergeBackend + NoteRepository,
    Sessions: SessionDirectory,
{
    Ok(Json(current_owner(&state, &jar).await?))
}
