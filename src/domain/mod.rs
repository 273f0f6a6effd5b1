//! Domain layer: identities, owned records and the merge ledger.
//!
//! Everything here is pure data with validating constructors; no I/O.

pub mod identity;
pub mod ledger;
pub mod record;

pub use identity::{
    AuthenticatedUser, GUEST_TOKEN_PREFIX, GuestToken, IdentityValidationError, OwnerId,
    OwnerIdentity, UserId,
};
pub use ledger::{MergeLedgerEntry, MergedModel};
pub use record::{
    MERGEABLE_RECORD_TYPES, NOTE, Note, NoteValidationError, QueryOptions, RecordMeta, RecordType,
};
