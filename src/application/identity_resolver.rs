//! Identity resolution.
//!
//! Collapses the two identity signals of a request into the single owner of
//! whatever the request reads or writes. An authenticated user always wins;
//! the guest token is only consulted when nobody is signed in.

use thiserror::Error;

use crate::domain::{AuthenticatedUser, GuestToken, OwnerIdentity};

/// Neither an authenticated user nor a guest token was present.
///
/// The guest token issuer runs ahead of every handler, so reaching this means
/// the request bypassed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("No identity available: neither an authenticated session nor a guest token is present")]
    NoIdentity,
}

/// Resolves the canonical owner of the current request.
///
/// # Errors
///
/// Returns [`IdentityError::NoIdentity`] when both signals are absent.
pub fn resolve_owner(
    user: Option<&AuthenticatedUser>,
    guest: Option<&GuestToken>,
) -> Result<OwnerIdentity, IdentityError> {
    match (user, guest) {
        (Some(user), _) => Ok(OwnerIdentity::User(user.id.clone())),
        (None, Some(guest)) => Ok(OwnerIdentity::Guest(guest.clone())),
        (None, None) => Err(IdentityError::NoIdentity),
    }
}
