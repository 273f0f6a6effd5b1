//! Application layer: identity resolution, the merge protocol and note use
//! cases.

pub mod identity_resolver;
pub mod merge;
pub mod notes;

pub use identity_resolver::{IdentityError, resolve_owner};
pub use merge::{
    AUTHENTICATION_REQUIRED_MESSAGE, ActionResult, GuestTokenStore, InMemoryTokenStore,
    MERGE_FAILED_MESSAGE, MergeError, MergeOrchestrator, MergeOutcome, MergeState,
    TokenClearError,
};
pub use notes::{NoteError, archive_note, create_note, list_notes};
