//! PostgreSQL storage adapter.
//!
//! One `sqlx` transaction spans every per-type `UPDATE` and the ledger
//! `INSERT`. The `UNIQUE (guest_id, user_id)` constraint on
//! `guest_merge_log` decides which of two racing merges commits; the loser's
//! insert fails with a unique violation, reported as
//! [`StorageError::Conflict`].
//!
//! # Database Schema
//!
//! See `migrations/`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::storage::{
    MergeBackend, MergeLedger, MergeTransaction, NoteRepository, OwnershipGrant, SessionDirectory,
    StorageError,
};
use crate::domain::{
    AuthenticatedUser, GuestToken, MergeLedgerEntry, MergedModel, Note, OwnerId, QueryOptions,
    RecordMeta, RecordType, UserId,
};

/// SQLSTATE for `serialization_failure`.
const SERIALIZATION_FAILURE: &str = "40001";

/// Maps a `sqlx` error onto the storage taxonomy.
fn map_sqlx_error(error: sqlx::Error) -> StorageError {
    match &error {
        sqlx::Error::Database(database_error)
            if database_error.is_unique_violation()
                || database_error.code().as_deref() == Some(SERIALIZATION_FAILURE) =>
        {
            StorageError::Conflict(database_error.message().to_string())
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => StorageError::Connection(error.to_string()),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StorageError::Serialization(error.to_string())
        }
        _ => StorageError::Query(error.to_string()),
    }
}

fn corrupt(column: &str, message: impl std::fmt::Display) -> StorageError {
    StorageError::Serialization(format!("invalid {column}: {message}"))
}

// =============================================================================
// Pool configuration
// =============================================================================

/// Connection pool settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresPoolConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl PostgresPoolConfig {
    #[must_use]
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub const fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }
}

// =============================================================================
// PostgresStore
// =============================================================================

/// PostgreSQL-backed implementation of every storage port.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Connection`] if the database is unreachable.
    pub async fn connect(config: &PostgresPoolConfig) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(|error| StorageError::Connection(error.to_string()))?;
        Ok(Self::new(pool))
    }

    /// Applies the bundled migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Query`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|error| StorageError::Query(error.to_string()))
    }

    /// Closes the pool, waiting for checked-out connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

type LedgerRow = (String, String, Json<Vec<MergedModel>>, i64, DateTime<Utc>);

impl MergeLedger for PostgresStore {
    async fn find_entry(
        &self,
        guest: &GuestToken,
        user: &UserId,
    ) -> Result<Option<MergeLedgerEntry>, StorageError> {
        let row: Option<LedgerRow> = sqlx::query_as(
            "SELECT guest_id, user_id, merged_models, total_merged, merged_at \
             FROM guest_merge_log WHERE guest_id = $1 AND user_id = $2",
        )
        .bind(guest.as_str())
        .bind(user.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(
            |(guest_id, user_id, Json(merged_models), total_merged, merged_at)| {
                Ok(MergeLedgerEntry {
                    guest_id: GuestToken::parse(guest_id)
                        .map_err(|error| corrupt("guest_id", error))?,
                    user_id: UserId::parse(user_id).map_err(|error| corrupt("user_id", error))?,
                    merged_models,
                    total_merged: u64::try_from(total_merged)
                        .map_err(|error| corrupt("total_merged", error))?,
                    merged_at,
                })
            },
        )
        .transpose()
    }
}

impl MergeBackend for PostgresStore {
    type Transaction = PostgresTransaction;

    async fn begin(&self, _grant: OwnershipGrant) -> Result<Self::Transaction, StorageError> {
        let transaction = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(PostgresTransaction { transaction })
    }
}

type NoteRow = (
    Uuid,
    String,
    bool,
    DateTime<Utc>,
    DateTime<Utc>,
    String,
    String,
);

fn note_from_row(
    (id, owner_id, is_archived, created_at, updated_at, title, content): NoteRow,
) -> Note {
    Note {
        meta: RecordMeta {
            id,
            owner_id: OwnerId::from_stored(owner_id),
            is_archived,
            created_at,
            updated_at,
        },
        title,
        content,
    }
}

impl NoteRepository for PostgresStore {
    async fn insert_note(&self, note: &Note) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO notes (id, owner_id, is_archived, created_at, updated_at, title, content) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(note.meta.id)
        .bind(note.meta.owner_id.as_str())
        .bind(note.meta.is_archived)
        .bind(note.meta.created_at)
        .bind(note.meta.updated_at)
        .bind(&note.title)
        .bind(&note.content)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn list_notes(
        &self,
        owner: &OwnerId,
        options: QueryOptions,
    ) -> Result<Vec<Note>, StorageError> {
        let rows: Vec<NoteRow> = sqlx::query_as(
            "SELECT id, owner_id, is_archived, created_at, updated_at, title, content \
             FROM notes WHERE owner_id = $1 AND ($2 OR is_archived = FALSE) \
             ORDER BY created_at DESC",
        )
        .bind(owner.as_str())
        .bind(options.include_archived)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(note_from_row).collect())
    }

    async fn archive_note(&self, owner: &OwnerId, id: Uuid) -> Result<bool, StorageError> {
        let result = sqlx::query(
            "UPDATE notes SET is_archived = TRUE, updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2",
        )
        .bind(id)
        .bind(owner.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}

impl SessionDirectory for PostgresStore {
    async fn lookup(&self, session_token: &str) -> Result<Option<AuthenticatedUser>, StorageError> {
        let row: Option<(String, Option<String>)> = sqlx::query_as(
            "SELECT user_id, user_name FROM sessions \
             WHERE session_token = $1 AND expires_at > NOW()",
        )
        .bind(session_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(|(user_id, name)| {
            let id = UserId::parse(user_id).map_err(|error| corrupt("user_id", error))?;
            Ok(AuthenticatedUser { id, name })
        })
        .transpose()
    }
}

// =============================================================================
// PostgresTransaction
// =============================================================================

/// A merge transaction. Dropping it without commit rolls back.
#[derive(Debug)]
pub struct PostgresTransaction {
    transaction: sqlx::Transaction<'static, Postgres>,
}

impl MergeTransaction for PostgresTransaction {
    async fn reassign_ownership(
        &mut self,
        record_type: &RecordType,
        from: &OwnerId,
        to: &OwnerId,
        options: QueryOptions,
    ) -> Result<u64, StorageError> {
        // Table names come from the static registry only.
        let statement = if options.include_archived {
            format!(
                "UPDATE {} SET owner_id = $1, updated_at = NOW() WHERE owner_id = $2",
                record_type.table
            )
        } else {
            format!(
                "UPDATE {} SET owner_id = $1, updated_at = NOW() \
                 WHERE owner_id = $2 AND is_archived = FALSE",
                record_type.table
            )
        };

        let result = sqlx::query(&statement)
            .bind(to.as_str())
            .bind(from.as_str())
            .execute(&mut *self.transaction)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }

    async fn create_entry(&mut self, entry: &MergeLedgerEntry) -> Result<(), StorageError> {
        let total_merged = i64::try_from(entry.total_merged)
            .map_err(|error| StorageError::Serialization(error.to_string()))?;

        sqlx::query(
            "INSERT INTO guest_merge_log (guest_id, user_id, merged_models, total_merged, merged_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(entry.guest_id.as_str())
        .bind(entry.user_id.as_str())
        .bind(Json(&entry.merged_models))
        .bind(total_merged)
        .bind(entry.merged_at)
        .execute(&mut *self.transaction)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn commit(self) -> Result<(), StorageError> {
        self.transaction.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(self) -> Result<(), StorageError> {
        self.transaction.rollback().await.map_err(map_sqlx_error)
    }
}
