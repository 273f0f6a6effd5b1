//! Owner-scoped note use cases.
//!
//! These are the ordinary write paths that create the records a merge later
//! moves. None of them can change a note's owner.

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Note, NoteValidationError, OwnerIdentity, QueryOptions};
use crate::infrastructure::{NoteRepository, StorageError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoteError {
    #[error(transparent)]
    InvalidTitle(#[from] NoteValidationError),

    #[error("Note not found: {0}")]
    NotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Creates a note owned by `owner`.
///
/// # Errors
///
/// Returns [`NoteError::InvalidTitle`] for a blank or overlong title.
pub async fn create_note<R: NoteRepository>(
    repository: &R,
    owner: &OwnerIdentity,
    title: &str,
    content: Option<String>,
) -> Result<Note, NoteError> {
    let note = Note::create(owner.owner_id(), title, content, Utc::now())?;
    repository.insert_note(&note).await?;
    tracing::debug!(note_id = %note.meta.id, owner_kind = owner.kind(), "Note created");
    Ok(note)
}

/// Lists `owner`'s notes, newest first.
///
/// # Errors
///
/// Returns [`NoteError::Storage`] if the read fails.
pub async fn list_notes<R: NoteRepository>(
    repository: &R,
    owner: &OwnerIdentity,
    options: QueryOptions,
) -> Result<Vec<Note>, NoteError> {
    Ok(repository.list_notes(&owner.owner_id(), options).await?)
}

/// Soft-deletes one of `owner`'s notes.
///
/// # Errors
///
/// Returns [`NoteError::NotFound`] if `owner` has no note with that id.
pub async fn archive_note<R: NoteRepository>(
    repository: &R,
    owner: &OwnerIdentity,
    id: Uuid,
) -> Result<(), NoteError> {
    if repository.archive_note(&owner.owner_id(), id).await? {
        Ok(())
    } else {
        Err(NoteError::NotFound(id))
    }
}
