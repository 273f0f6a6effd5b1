//! In-memory storage adapter.
//!
//! Backs tests and the database-less demo mode. Transactions are serialized
//! by a writer mutex and work on a staged copy of the committed state; the
//! copy replaces the committed state in one step on commit, so readers see
//! either the state before or after a merge and never a mix of both.
//!
//! Faults can be injected to exercise rollback paths.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use super::storage::{
    MergeBackend, MergeLedger, MergeTransaction, NoteRepository, OwnershipGrant, SessionDirectory,
    StorageError,
};
use crate::domain::{
    AuthenticatedUser, GuestToken, MergeLedgerEntry, NOTE, Note, OwnerId, QueryOptions,
    RecordMeta, RecordType, UserId,
};

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Clone)]
enum RecordBody {
    Note { title: String, content: String },
    Opaque,
}

#[derive(Debug, Clone)]
struct StoredRecord {
    meta: RecordMeta,
    body: RecordBody,
}

impl StoredRecord {
    fn to_note(&self) -> Option<Note> {
        match &self.body {
            RecordBody::Note { title, content } => Some(Note {
                meta: self.meta.clone(),
                title: title.clone(),
                content: content.clone(),
            }),
            RecordBody::Opaque => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct StoreState {
    tables: HashMap<&'static str, Vec<StoredRecord>>,
    ledger: HashMap<(GuestToken, UserId), MergeLedgerEntry>,
}

/// Failure points that can be switched on for tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Every ledger insert fails.
    LedgerWrite,
    /// Every commit fails (and the transaction is discarded).
    Commit,
}

#[derive(Debug, Default)]
struct Faults {
    ledger_write: AtomicBool,
    commit: AtomicBool,
}

impl Faults {
    const fn flag(&self, fault: Fault) -> &AtomicBool {
        match fault {
            Fault::LedgerWrite => &self.ledger_write,
            Fault::Commit => &self.commit,
        }
    }

    fn check(&self, fault: Fault) -> Result<(), StorageError> {
        if self.flag(fault).load(Ordering::SeqCst) {
            Err(StorageError::InjectedFault(format!("{fault:?}")))
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    committed: RwLock<StoreState>,
    writer: Arc<Mutex<()>>,
    faults: Faults,
    reassignment_calls: AtomicU64,
}

// =============================================================================
// InMemoryStore
// =============================================================================

/// Shared in-memory store. Cloning shares the same state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns a failure point on.
    pub fn inject(&self, fault: Fault) {
        self.inner.faults.flag(fault).store(true, Ordering::SeqCst);
    }

    /// Turns every failure point off.
    pub fn clear_faults(&self) {
        for fault in [Fault::LedgerWrite, Fault::Commit] {
            self.inner.faults.flag(fault).store(false, Ordering::SeqCst);
        }
    }

    /// How many times any transaction asked to reassign ownership.
    #[must_use]
    pub fn reassignment_calls(&self) -> u64 {
        self.inner.reassignment_calls.load(Ordering::SeqCst)
    }

    /// Inserts `count` opaque records of `record_type` owned by `owner`.
    pub async fn seed_records(
        &self,
        record_type: &RecordType,
        owner: &OwnerId,
        count: usize,
        archived: bool,
    ) {
        let _writer = self.inner.writer.lock().await;
        let mut state = self.inner.committed.write().await;
        let table = state.tables.entry(record_type.table).or_default();
        let now = Utc::now();
        table.extend((0..count).map(|_| {
            let mut meta = RecordMeta::new(owner.clone(), now);
            meta.is_archived = archived;
            StoredRecord {
                meta,
                body: RecordBody::Opaque,
            }
        }));
    }

    /// Counts committed records of `record_type` owned by `owner`.
    pub async fn count_owned(
        &self,
        record_type: &RecordType,
        owner: &OwnerId,
        options: QueryOptions,
    ) -> usize {
        let state = self.inner.committed.read().await;
        state.tables.get(record_type.table).map_or(0, |table| {
            table
                .iter()
                .filter(|record| &record.meta.owner_id == owner && options.admits(&record.meta))
                .count()
        })
    }

    /// Every committed ledger entry.
    pub async fn ledger_entries(&self) -> Vec<MergeLedgerEntry> {
        let state = self.inner.committed.read().await;
        state.ledger.values().cloned().collect()
    }
}

impl MergeLedger for InMemoryStore {
    async fn find_entry(
        &self,
        guest: &GuestToken,
        user: &UserId,
    ) -> Result<Option<MergeLedgerEntry>, StorageError> {
        let state = self.inner.committed.read().await;
        Ok(state.ledger.get(&(guest.clone(), user.clone())).cloned())
    }
}

impl MergeBackend for InMemoryStore {
    type Transaction = InMemoryTransaction;

    async fn begin(&self, _grant: OwnershipGrant) -> Result<Self::Transaction, StorageError> {
        let writer = Arc::clone(&self.inner.writer).lock_owned().await;
        let staged = self.inner.committed.read().await.clone();
        Ok(InMemoryTransaction {
            inner: Arc::clone(&self.inner),
            staged,
            _writer: writer,
        })
    }
}

impl NoteRepository for InMemoryStore {
    async fn insert_note(&self, note: &Note) -> Result<(), StorageError> {
        let _writer = self.inner.writer.lock().await;
        let mut state = self.inner.committed.write().await;
        state
            .tables
            .entry(NOTE.table)
            .or_default()
            .push(StoredRecord {
                meta: note.meta.clone(),
                body: RecordBody::Note {
                    title: note.title.clone(),
                    content: note.content.clone(),
                },
            });
        Ok(())
    }

    async fn list_notes(
        &self,
        owner: &OwnerId,
        options: QueryOptions,
    ) -> Result<Vec<Note>, StorageError> {
        let state = self.inner.committed.read().await;
        let mut notes: Vec<Note> = state
            .tables
            .get(NOTE.table)
            .into_iter()
            .flatten()
            .filter(|record| &record.meta.owner_id == owner && options.admits(&record.meta))
            .filter_map(StoredRecord::to_note)
            .collect();
        notes.sort_by(|left, right| right.meta.created_at.cmp(&left.meta.created_at));
        Ok(notes)
    }

    async fn archive_note(&self, owner: &OwnerId, id: Uuid) -> Result<bool, StorageError> {
        let _writer = self.inner.writer.lock().await;
        let mut state = self.inner.committed.write().await;
        let record = state.tables.get_mut(NOTE.table).and_then(|table| {
            table
                .iter_mut()
                .find(|record| record.meta.id == id && &record.meta.owner_id == owner)
        });
        Ok(record.is_some_and(|record| {
            record.meta.is_archived = true;
            record.meta.updated_at = Utc::now();
            true
        }))
    }
}

// =============================================================================
// InMemoryTransaction
// =============================================================================

/// A staged copy of the store, holding the writer lock until it ends.
#[derive(Debug)]
pub struct InMemoryTransaction {
    inner: Arc<Inner>,
    staged: StoreState,
    _writer: OwnedMutexGuard<()>,
}

impl MergeTransaction for InMemoryTransaction {
    async fn reassign_ownership(
        &mut self,
        record_type: &RecordType,
        from: &OwnerId,
        to: &OwnerId,
        options: QueryOptions,
    ) -> Result<u64, StorageError> {
        self.inner.reassignment_calls.fetch_add(1, Ordering::SeqCst);

        let now = Utc::now();
        let mut modified = 0;
        if let Some(table) = self.staged.tables.get_mut(record_type.table) {
            for record in table
                .iter_mut()
                .filter(|record| &record.meta.owner_id == from && options.admits(&record.meta))
            {
                record.meta.owner_id = to.clone();
                record.meta.updated_at = now;
                modified += 1;
            }
        }
        Ok(modified)
    }

    async fn create_entry(&mut self, entry: &MergeLedgerEntry) -> Result<(), StorageError> {
        self.inner.faults.check(Fault::LedgerWrite)?;

        let key = (entry.guest_id.clone(), entry.user_id.clone());
        if self.staged.ledger.contains_key(&key) {
            return Err(StorageError::Conflict(format!(
                "merge ledger already has an entry for user {}",
                entry.user_id
            )));
        }
        self.staged.ledger.insert(key, entry.clone());
        Ok(())
    }

    async fn commit(self) -> Result<(), StorageError> {
        self.inner.faults.check(Fault::Commit)?;

        let Self {
            inner,
            staged,
            _writer,
        } = self;
        *inner.committed.write().await = staged;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StorageError> {
        Ok(())
    }
}

// =============================================================================
// InMemorySessionDirectory
// =============================================================================

/// Session lookup backed by a map, for tests and demo mode.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionDirectory {
    sessions: Arc<RwLock<HashMap<String, AuthenticatedUser>>>,
}

impl InMemorySessionDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a live session.
    pub async fn register(&self, session_token: impl Into<String>, user: AuthenticatedUser) {
        self.sessions.write().await.insert(session_token.into(), user);
    }

    /// Ends a session.
    pub async fn revoke(&self, session_token: &str) {
        self.sessions.write().await.remove(session_token);
    }
}

impl SessionDirectory for InMemorySessionDirectory {
    async fn lookup(&self, session_token: &str) -> Result<Option<AuthenticatedUser>, StorageError> {
        Ok(self.sessions.read().await.get(session_token).cloned())
    }
}
