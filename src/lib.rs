//! # guest-merge
//!
//! Lets anonymous visitors create data before signing in, then moves that
//! data to their account exactly once when they authenticate.
//!
//! # Architecture
//!
//! The crate follows the Onion Architecture:
//!
//! - **Domain Layer**: identities, owned records, merge ledger entries
//! - **Application Layer**: identity resolution, the merge orchestrator,
//!   note use cases
//! - **Infrastructure Layer**: configuration, PostgreSQL and in-memory
//!   storage
//! - **API Layer**: axum router, handlers, the guest token issuer
//!
//! # Merge guarantees
//!
//! - A `(guest, user)` pair is merged at most once; the merge ledger is the
//!   only source of truth for that.
//! - Ownership of every registered record type and the ledger entry are
//!   written in one transaction.
//! - Racing merges for the same pair produce one ledger entry; the loser
//!   reports the winner's total.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
