//! Merge outcome, errors and the caller-facing result envelope.

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::infrastructure::StorageError;

/// Shown to unauthenticated callers.
pub const AUTHENTICATION_REQUIRED_MESSAGE: &str = "Authentication required to merge guest data";

/// Shown for every internal failure.
pub const MERGE_FAILED_MESSAGE: &str = "Failed to merge guest data. Please try again.";

// =============================================================================
// MergeOutcome
// =============================================================================

/// What a successful merge call reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOutcome {
    pub merged_count: u64,
    pub already_merged: bool,
}

impl MergeOutcome {
    /// No guest token: nothing was migrated.
    #[must_use]
    pub const fn nothing_to_merge() -> Self {
        Self {
            merged_count: 0,
            already_merged: false,
        }
    }

    /// This call committed the migration of `merged_count` records.
    #[must_use]
    pub const fn merged(merged_count: u64) -> Self {
        Self {
            merged_count,
            already_merged: false,
        }
    }

    /// A ledger entry already existed; `merged_count` is its stored total.
    #[must_use]
    pub const fn already_merged(merged_count: u64) -> Self {
        Self {
            merged_count,
            already_merged: true,
        }
    }
}

// =============================================================================
// MergeError
// =============================================================================

/// Why a merge failed.
///
/// `Display` is the text shown to the caller. Storage details stay in the
/// `source` chain and are only logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("Authentication required to merge guest data")]
    AuthenticationRequired,

    #[error("Failed to merge guest data. Please try again.")]
    Storage(#[source] StorageError),
}

impl From<StorageError> for MergeError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

// =============================================================================
// MergeState
// =============================================================================

/// Terminal states of one merge invocation, as they appear in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeState {
    Unauthenticated,
    NoGuestToken,
    AlreadyMerged,
    Committed,
    Aborted,
}

impl MergeState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::NoGuestToken => "no_guest_token",
            Self::AlreadyMerged => "already_merged",
            Self::Committed => "committed",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for MergeState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

// =============================================================================
// ActionResult
// =============================================================================

/// Discriminated result handed back to the caller.
///
/// Serializes as `{"success": true, "data": ...}` or
/// `{"success": false, "error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult<T> {
    Success(T),
    Failure(String),
}

impl<T> ActionResult<T> {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure(message) => Some(message),
        }
    }
}

impl<T, E: std::error::Error> From<Result<T, E>> for ActionResult<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::Success(data),
            Err(error) => Self::Failure(error.to_string()),
        }
    }
}

impl<T: Serialize> Serialize for ActionResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ActionResult", 2)?;
        match self {
            Self::Success(data) => {
                state.serialize_field("success", &true)?;
                state.serialize_field("data", data)?;
            }
            Self::Failure(message) => {
                state.serialize_field("success", &false)?;
                state.serialize_field("error", message)?;
            }
        }
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn outcome_uses_camel_case() {
        let json = serde_json::to_value(MergeOutcome::already_merged(2)).unwrap();

        assert_eq!(json, json!({"mergedCount": 2, "alreadyMerged": true}));
    }

    #[rstest]
    fn success_envelope() {
        let result: ActionResult<MergeOutcome> = ActionResult::Success(MergeOutcome::merged(3));

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"success": true, "data": {"mergedCount": 3, "alreadyMerged": false}})
        );
    }

    #[rstest]
    fn failure_envelope() {
        let result: ActionResult<MergeOutcome> =
            Err::<MergeOutcome, _>(MergeError::AuthenticationRequired).into();

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"success": false, "error": AUTHENTICATION_REQUIRED_MESSAGE})
        );
    }

    #[rstest]
    #[case(StorageError::Connection("password authentication failed for user app".to_string()))]
    #[case(StorageError::Query("relation \"notes\" does not exist".to_string()))]
    #[case(StorageError::InjectedFault("LedgerWrite".to_string()))]
    fn storage_details_never_reach_the_caller(#[case] storage: StorageError) {
        let detail = storage.to_string();
        let result: ActionResult<MergeOutcome> =
            Err::<MergeOutcome, _>(MergeError::from(storage)).into();

        assert_eq!(result.error(), Some(MERGE_FAILED_MESSAGE));
        assert!(!result.error().unwrap().contains(&detail));
    }

    #[rstest]
    fn merge_state_names() {
        assert_eq!(MergeState::AlreadyMerged.to_string(), "already_merged");
        assert_eq!(MergeState::Aborted.as_str(), "aborted");
    }
}
