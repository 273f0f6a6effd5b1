//! Guest-to-user merge protocol.

pub mod orchestrator;
pub mod result;
pub mod token_store;

pub use orchestrator::MergeOrchestrator;
pub use result::{
    AUTHENTICATION_REQUIRED_MESSAGE, ActionResult, MERGE_FAILED_MESSAGE, MergeError, MergeOutcome,
    MergeState,
};
pub use token_store::{GuestTokenStore, InMemoryTokenStore, TokenClearError};
