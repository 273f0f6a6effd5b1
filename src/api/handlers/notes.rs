use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use uuid::Uuid;

use super::current_owner;
use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::application::notes;
use crate::domain::{Note, QueryOptions};
use crate::infrastructure::{MergeBackend, NoteRepository, SessionDirectory};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateNoteRequest {
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
}

// =============================================================================
// Create Note Handler
// =============================================================================

pub async fn create_note<Store, Sessions>(
    State(state): State<AppState<Store, Sessions>>,
    jar: CookieJar,
    Json(request): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<Note>), ApiError>
where
    Store: MergeBackend + NoteRepository,
    Sessions: SessionDirectory,
{
    let owner = current_owner(&state, &jar).await?;
    let note = notes::create_note(&state.store, &owner, &request.title, request.content).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

// =============================================================================
// List Notes Handler
// =============================================================================

pub async fn list_notes<Store, Sessions>(
    State(state): State<AppState<Store, Sessions>>,
    jar: CookieJar,
    Query(options): Query<QueryOptions>,
) -> Result<Json<Vec<Note>>, ApiError>
where
    Store: MergeBackend + NoteRepository,
    Sessions: SessionDirectory,
{
    let owner = current_owner(&state, &jar).await?;
    Ok(Json(notes::list_notes(&state.store, &owner, options).await?))
}

// =============================================================================
// Archive Note Handler
// =============================================================================

pub async fn archive_note<Store, Sessions>(
    State(state): State<AppState<Store, Sessions>>,
    jar: CookieJar,
    Path(note_id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
    Store: MergeBackend + NoteRepository,
    Sessions: SessionDirectory,
{
    let owner = current_owner(&state, &jar).await?;
    notes::archive_note(&state.store, &owner, note_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
