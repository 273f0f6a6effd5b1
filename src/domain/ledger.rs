//! Merge ledger entries.
//!
//! One entry exists per completed `(guest, user)` merge. Entries are never
//! updated or deleted; their presence is what makes a merge idempotent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::{GuestToken, UserId};
use super::record::RecordType;

/// Number of records migrated for one record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedModel {
    pub model: String,
    pub count: u64,
}

impl MergedModel {
    #[must_use]
    pub fn new(record_type: &RecordType, count: u64) -> Self {
        Self {
            model: record_type.display_name.to_string(),
            count,
        }
    }
}

/// Permanent record of a completed guest-to-user migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeLedgerEntry {
    pub guest_id: GuestToken,
    pub user_id: UserId,
    pub merged_models: Vec<MergedModel>,
    pub total_merged: u64,
    pub merged_at: DateTime<Utc>,
}

impl MergeLedgerEntry {
    /// Builds an entry whose total is the sum of the per-type counts.
    #[must_use]
    pub fn new(
        guest_id: GuestToken,
        user_id: UserId,
        merged_models: Vec<MergedModel>,
        merged_at: DateTime<Utc>,
    ) -> Self {
        let total_merged = merged_models.iter().map(|merged| merged.count).sum();
        Self {
            guest_id,
            user_id,
            merged_models,
            total_merged,
            merged_at,
        }
    }
}
