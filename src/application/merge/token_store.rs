//! Read/clear access to the caller's guest token.

use thiserror::Error;

use crate::domain::GuestToken;

/// Clearing the guest token failed. Never fatal to a merge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to clear guest token: {0}")]
pub struct TokenClearError(pub String);

/// The client-held guest credential of the current request.
pub trait GuestTokenStore {
    /// The guest token presented with the request, if any.
    fn current(&self) -> Option<GuestToken>;

    /// Deletes the credential from the client.
    ///
    /// # Errors
    ///
    /// Returns [`TokenClearError`] if the deletion could not be scheduled.
    fn clear(&mut self) -> Result<(), TokenClearError>;
}

/// A token store held in memory, for tests and non-HTTP callers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryTokenStore {
    token: Option<GuestToken>,
    fail_clear: bool,
    clear_attempts: usize,
}

impl InMemoryTokenStore {
    #[must_use]
    pub const fn new(token: Option<GuestToken>) -> Self {
        Self {
            token,
            fail_clear: false,
            clear_attempts: 0,
        }
    }

    #[must_use]
    pub const fn with_token(token: GuestToken) -> Self {
        Self::new(Some(token))
    }

    /// Makes every subsequent [`GuestTokenStore::clear`] fail.
    #[must_use]
    pub const fn failing_clear(mut self) -> Self {
        self.fail_clear = true;
        self
    }

    #[must_use]
    pub const fn clear_attempts(&self) -> usize {
        self.clear_attempts
    }
}

impl GuestTokenStore for InMemoryTokenStore {
    fn current(&self) -> Option<GuestToken> {
        self.token.clone()
    }

    fn clear(&mut self) -> Result<(), TokenClearError> {
        self.clear_attempts += 1;
        if self.fail_clear {
            return Err(TokenClearError("token store is read-only".to_string()));
        }
        self.token = None;
        Ok(())
    }
}
