//! Owned records and the mergeable-type registry.
//!
//! Every persisted entity that belongs to an owner carries [`RecordMeta`].
//! The `owner_id` column is written once at creation; the only path that
//! rewrites it is the merge transaction.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::identity::OwnerId;

// =============================================================================
// RecordType
// =============================================================================

/// A record type that participates in ownership transfer.
///
/// `table` is the storage-level collection name and is only ever taken from
/// a static registry, never from request input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordType {
    pub table: &'static str,
    pub display_name: &'static str,
}

impl RecordType {
    #[must_use]
    pub const fn new(table: &'static str, display_name: &'static str) -> Self {
        Self {
            table,
            display_name,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.display_name)
    }
}

/// Notes written by guests and users.
pub const NOTE: RecordType = RecordType::new("notes", "Note");

/// Every record type the merge migrates, in migration order.
///
/// A new owned record type is only merged once it is listed here.
pub const MERGEABLE_RECORD_TYPES: &[RecordType] = &[NOTE];

// =============================================================================
// QueryOptions
// =============================================================================

/// Visibility options threaded through every owner-scoped query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct QueryOptions {
    /// Include soft-deleted (archived) records.
    #[serde(default)]
    pub include_archived: bool,
}

impl QueryOptions {
    /// Default visibility: archived records are hidden.
    #[must_use]
    pub const fn active_only() -> Self {
        Self {
            include_archived: false,
        }
    }

    /// Every record regardless of soft-delete state.
    #[must_use]
    pub const fn all_records() -> Self {
        Self {
            include_archived: true,
        }
    }

    #[must_use]
    pub const fn admits(&self, meta: &RecordMeta) -> bool {
        self.include_archived || !meta.is_archived
    }
}

// =============================================================================
// RecordMeta
// =============================================================================

/// Base fields shared by every owned record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecordMeta {
    /// Metadata for a record created now by `owner_id`.
    #[must_use]
    pub fn new(owner_id: OwnerId, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            owner_id,
            is_archived: false,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Note
// =============================================================================

/// Maximum title length, in characters.
pub const NOTE_TITLE_MAX_LENGTH: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoteValidationError {
    #[error("Title is required")]
    TitleRequired,

    #[error("Title must be under {max} characters", max = NOTE_TITLE_MAX_LENGTH)]
    TitleTooLong,
}

/// A user-authored note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub content: String,
}

impl Note {
    /// Validates the input and builds a note owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns [`NoteValidationError`] when the trimmed title is empty or too long.
    pub fn create(
        owner_id: OwnerId,
        title: &str,
        content: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, NoteValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(NoteValidationError::TitleRequired);
        }
        if title.chars().count() > NOTE_TITLE_MAX_LENGTH {
            return Err(NoteValidationError::TitleTooLong);
        }

        Ok(Self {
            meta: RecordMeta::new(owner_id, now),
            title: title.to_string(),
            content: content.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn owner() -> OwnerId {
        OwnerId::from_stored("guest_abc123")
    }

    #[rstest]
    fn create_trims_title_and_defaults_content() {
        let note = Note::create(owner(), "  Groceries  ", None, Utc::now()).unwrap();

        assert_eq!(note.title, "Groceries");
        assert_eq!(note.content, "");
        assert!(!note.meta.is_archived);
        assert_eq!(note.meta.created_at, note.meta.updated_at);
    }

    #[rstest]
    #[case("", NoteValidationError::TitleRequired)]
    #[case("   ", NoteValidationError::TitleRequired)]
    fn blank_titles_are_rejected(#[case] title: &str, #[case] expected: NoteValidationError) {
        assert_eq!(Note::create(owner(), title, None, Utc::now()), Err(expected));
    }

    #[rstest]
    fn title_length_is_counted_in_characters() {
        let at_limit = "é".repeat(NOTE_TITLE_MAX_LENGTH);
        let over_limit = "é".repeat(NOTE_TITLE_MAX_LENGTH + 1);

        assert!(Note::create(owner(), &at_limit, None, Utc::now()).is_ok());
        assert_eq!(
            Note::create(owner(), &over_limit, None, Utc::now()),
            Err(NoteValidationError::TitleTooLong)
        );
    }

    #[rstest]
    #[case(QueryOptions::active_only(), false, true)]
    #[case(QueryOptions::active_only(), true, false)]
    #[case(QueryOptions::all_records(), true, true)]
    fn query_options_filter_archived(
        #[case] options: QueryOptions,
        #[case] archived: bool,
        #[case] admitted: bool,
    ) {
        let mut meta = RecordMeta::new(owner(), Utc::now());
        meta.is_archived = archived;

        assert_eq!(options.admits(&meta), admitted);
    }

    #[rstest]
    fn registry_contains_notes() {
        assert!(MERGEABLE_RECORD_TYPES.contains(&NOTE));
        assert_eq!(NOTE.to_string(), "Note");
    }
}
