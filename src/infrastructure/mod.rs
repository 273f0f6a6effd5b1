//! Infrastructure layer: configuration and storage adapters.

pub mod config;
pub mod in_memory;
pub mod postgres;
pub mod storage;

pub use config::{AppConfig, AppEnvironment, ConfigError, DEFAULT_SESSION_COOKIE_NAMES, LogFormat};
pub use in_memory::{Fault, InMemorySessionDirectory, InMemoryStore, InMemoryTransaction};
pub use postgres::{PostgresPoolConfig, PostgresStore, PostgresTransaction};
pub use storage::{
    MergeBackend, MergeLedger, MergeTransaction, NoteRepository, OwnershipGrant, SessionDirectory,
    StorageError,
};
