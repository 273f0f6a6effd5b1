//! Storage ports.
//!
//! The merge protocol needs three things from storage:
//!
//! - a point lookup on the merge ledger ([`MergeLedger`]),
//! - a transaction that spans every record type plus the ledger insert
//!   ([`MergeBackend`] / [`MergeTransaction`]),
//! - nothing else. In particular the privileged `owner_id` rewrite is only
//!   reachable through [`MergeTransaction`], never through the general
//!   record write path ([`NoteRepository`]).
//!
//! Methods return `impl Future + Send` so that generic axum handlers built on
//! top of them stay `Send`.

use std::future::Future;

use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    AuthenticatedUser, GuestToken, MergeLedgerEntry, Note, OwnerId, QueryOptions, RecordType,
    UserId,
};

// =============================================================================
// StorageError
// =============================================================================

/// Errors raised by storage adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The storage engine could not be reached.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A statement failed.
    #[error("Query error: {0}")]
    Query(String),

    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stored value could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A failure injected by a test double.
    #[error("Injected fault: {0}")]
    InjectedFault(String),
}

impl StorageError {
    /// Whether the error is a lost uniqueness race rather than a fault.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

// =============================================================================
// Merge ledger and transaction
// =============================================================================

/// Read side of the merge ledger.
pub trait MergeLedger: Send + Sync {
    /// Looks up the entry recorded for `(guest, user)`, if any.
    fn find_entry(
        &self,
        guest: &GuestToken,
        user: &UserId,
    ) -> impl Future<Output = Result<Option<MergeLedgerEntry>, StorageError>> + Send;
}

/// One atomic unit of work for a merge.
///
/// Dropping a transaction without calling [`MergeTransaction::commit`] must
/// discard every write made through it.
pub trait MergeTransaction: Send {
    /// Rewrites `owner_id` from `from` to `to` on every record of `record_type`
    /// admitted by `options` and returns how many rows changed.
    ///
    /// Zero matches is not an error.
    fn reassign_ownership(
        &mut self,
        record_type: &RecordType,
        from: &OwnerId,
        to: &OwnerId,
        options: QueryOptions,
    ) -> impl Future<Output = Result<u64, StorageError>> + Send;

    /// Inserts a ledger entry.
    ///
    /// # Errors
    ///
    /// Fails with [`StorageError::Conflict`] if an entry for the same
    /// `(guest, user)` pair already exists.
    fn create_entry(
        &mut self,
        entry: &MergeLedgerEntry,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Makes every write visible at once.
    fn commit(self) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Discards every write.
    fn rollback(self) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// Permission to open a [`MergeTransaction`].
///
/// Only this crate can mint one, so the `owner_id` rewrite stays reachable
/// from the merge orchestrator alone.
///
/// ```compile_fail
/// use guest_merge::infrastructure::OwnershipGrant;
///
/// let grant = OwnershipGrant::new();
/// ```
#[derive(Debug)]
pub struct OwnershipGrant(());

impl OwnershipGrant {
    pub(crate) const fn new() -> Self {
        Self(())
    }
}

/// A storage engine able to run merge transactions.
pub trait MergeBackend: MergeLedger + Clone + 'static {
    type Transaction: MergeTransaction;

    /// Opens a transaction.
    fn begin(
        &self,
        grant: OwnershipGrant,
    ) -> impl Future<Output = Result<Self::Transaction, StorageError>> + Send;
}

// =============================================================================
// General record access
// =============================================================================

/// Owner-scoped note access. Never changes a note's owner.
pub trait NoteRepository: Send + Sync {
    fn insert_note(&self, note: &Note) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn list_notes(
        &self,
        owner: &OwnerId,
        options: QueryOptions,
    ) -> impl Future<Output = Result<Vec<Note>, StorageError>> + Send;

    /// Soft-deletes a note. Returns `false` when `owner` has no such note.
    fn archive_note(
        &self,
        owner: &OwnerId,
        id: Uuid,
    ) -> impl Future<Output = Result<bool, StorageError>> + Send;
}

// =============================================================================
// Sessions
// =============================================================================

/// Resolves a session credential to the authenticated user behind it.
pub trait SessionDirectory: Send + Sync + 'static {
    /// Returns `None` for unknown or expired sessions.
    fn lookup(
        &self,
        session_token: &str,
    ) -> impl Future<Output = Result<Option<AuthenticatedUser>, StorageError>> + Send;
}
