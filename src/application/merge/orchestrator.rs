//! The merge orchestrator.
//!
//! Runs the guest-to-user ownership transfer at most once per
//! `(guest, user)` pair:
//!
//! 1. reject callers without an authenticated user;
//! 2. succeed with zero when there is no guest token;
//! 3. if the ledger already has an entry for the pair, clear the token and
//!    report the ledger's total without touching any record;
//! 4. otherwise reassign every registered record type (archived records
//!    included) and insert the ledger entry in one transaction;
//! 5. commit, then clear the token on a best-effort basis.
//!
//! A commit that loses the ledger uniqueness race is answered from the
//! winner's ledger entry.

use chrono::Utc;

use super::result::{ActionResult, MergeError, MergeOutcome, MergeState};
use super::token_store::GuestTokenStore;
use crate::domain::{
    AuthenticatedUser, GuestToken, MERGEABLE_RECORD_TYPES, MergeLedgerEntry, MergedModel,
    OwnerId, QueryOptions, RecordType, UserId,
};
use crate::infrastructure::{MergeBackend, MergeTransaction, OwnershipGrant, StorageError};

/// Merges guest-owned records into an authenticated user's account.
#[derive(Debug, Clone)]
pub struct MergeOrchestrator<B> {
    backend: B,
    registry: &'static [RecordType],
}

impl<B: MergeBackend> MergeOrchestrator<B> {
    /// Orchestrator over every registered mergeable record type.
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self::with_registry(backend, MERGEABLE_RECORD_TYPES)
    }

    #[must_use]
    pub const fn with_registry(backend: B, registry: &'static [RecordType]) -> Self {
        Self { backend, registry }
    }

    /// Runs the merge and folds every failure into an [`ActionResult`].
    pub async fn merge_guest_data<S>(
        &self,
        user: Option<&AuthenticatedUser>,
        tokens: &mut S,
    ) -> ActionResult<MergeOutcome>
    where
        S: GuestTokenStore + Send,
    {
        self.try_merge(user, tokens).await.into()
    }

    /// Runs the merge.
    ///
    /// # Errors
    ///
    /// - [`MergeError::AuthenticationRequired`] when `user` is `None`.
    /// - [`MergeError::Storage`] when the transaction could not be committed
    ///   for any reason other than a lost ledger race. Nothing is migrated in
    ///   that case.
    pub async fn try_merge<S>(
        &self,
        user: Option<&AuthenticatedUser>,
        tokens: &mut S,
    ) -> Result<MergeOutcome, MergeError>
    where
        S: GuestTokenStore + Send,
    {
        let Some(user) = user else {
            tracing::info!(
                state = %MergeState::Unauthenticated,
                "Merge rejected: caller is not authenticated"
            );
            return Err(MergeError::AuthenticationRequired);
        };

        let Some(guest) = tokens.current() else {
            tracing::debug!(
                state = %MergeState::NoGuestToken,
                user_id = %user.id,
                "Nothing to merge"
            );
            return Ok(MergeOutcome::nothing_to_merge());
        };

        let existing = self
            .backend
            .find_entry(&guest, &user.id)
            .await
            .map_err(|error| aborted(&guest, &user.id, error))?;
        if let Some(entry) = existing {
            return Ok(already_merged(&entry, tokens));
        }

        match self.migrate(&guest, &user.id).await {
            Ok(entry) => {
                tracing::info!(
                    state = %MergeState::Committed,
                    user_id = %user.id,
                    guest = %guest.redacted(),
                    total_merged = entry.total_merged,
                    "Guest data merged"
                );
                clear_token(tokens, &guest);
                Ok(MergeOutcome::merged(entry.total_merged))
            }
            Err(error) if error.is_conflict() => {
                tracing::debug!(
                    user_id = %user.id,
                    guest = %guest.redacted(),
                    "Lost the ledger race, re-reading the ledger"
                );
                match self.backend.find_entry(&guest, &user.id).await {
                    Ok(Some(entry)) => Ok(already_merged(&entry, tokens)),
                    Ok(None) => Err(aborted(&guest, &user.id, error)),
                    Err(reread) => Err(aborted(&guest, &user.id, reread)),
                }
            }
            Err(error) => Err(aborted(&guest, &user.id, error)),
        }
    }

    /// Reassigns every registered type and records the ledger entry, all in
    /// one transaction.
    async fn migrate(
        &self,
        guest: &GuestToken,
        user: &UserId,
    ) -> Result<MergeLedgerEntry, StorageError> {
        let mut transaction = self.backend.begin(OwnershipGrant::new()).await?;

        match self.apply(&mut transaction, guest, user).await {
            Ok(entry) => {
                transaction.commit().await?;
                Ok(entry)
            }
            Err(error) => {
                if let Err(rollback_error) = transaction.rollback().await {
                    tracing::warn!(error = %rollback_error, "Rollback failed");
                }
                Err(error)
            }
        }
    }

    async fn apply(
        &self,
        transaction: &mut B::Transaction,
        guest: &GuestToken,
        user: &UserId,
    ) -> Result<MergeLedgerEntry, StorageError> {
        let from = OwnerId::from(guest);
        let to = OwnerId::from(user);

        let mut merged_models = Vec::with_capacity(self.registry.len());
        for record_type in self.registry {
            let count = transaction
                .reassign_ownership(record_type, &from, &to, QueryOptions::all_records())
                .await?;
            merged_models.push(MergedModel::new(record_type, count));
        }

        let entry = MergeLedgerEntry::new(guest.clone(), user.clone(), merged_models, Utc::now());
        transaction.create_entry(&entry).await?;
        Ok(entry)
    }
}

fn already_merged<S: GuestTokenStore>(entry: &MergeLedgerEntry, tokens: &mut S) -> MergeOutcome {
    tracing::info!(
        state = %MergeState::AlreadyMerged,
        user_id = %entry.user_id,
        guest = %entry.guest_id.redacted(),
        total_merged = entry.total_merged,
        "Guest data was already merged"
    );
    clear_token(tokens, &entry.guest_id);
    MergeOutcome::already_merged(entry.total_merged)
}

fn clear_token<S: GuestTokenStore>(tokens: &mut S, guest: &GuestToken) {
    if let Err(error) = tokens.clear() {
        tracing::warn!(guest = %guest.redacted(), error = %error, "Guest token not cleared");
    }
}

fn aborted(guest: &GuestToken, user: &UserId, error: StorageError) -> MergeError {
    tracing::error!(
        state = %MergeState::Aborted,
        user_id = %user,
        guest = %guest.redacted(),
        error = %error,
        "Guest data merge failed"
    );
    MergeError::Storage(error)
}
