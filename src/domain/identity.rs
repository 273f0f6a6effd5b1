//! Identity value objects.
//!
//! A request is owned by exactly one [`OwnerIdentity`]: either an
//! authenticated user or an anonymous guest holding a [`GuestToken`].
//! Records only ever see the flattened [`OwnerId`] string.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Prefix carried by every guest token minted by this service.
pub const GUEST_TOKEN_PREFIX: &str = "guest_";

/// Upper bound on the length of an accepted guest token or user identifier.
pub const MAX_IDENTIFIER_LENGTH: usize = 256;

/// Validation errors for identity value objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityValidationError {
    /// The identifier is empty.
    #[error("{kind} must not be empty")]
    Empty {
        /// Which identifier was being validated.
        kind: &'static str,
    },

    /// The identifier exceeds [`MAX_IDENTIFIER_LENGTH`].
    #[error("{kind} must be at most {max} characters", max = MAX_IDENTIFIER_LENGTH)]
    TooLong {
        /// Which identifier was being validated.
        kind: &'static str,
    },

    /// The identifier contains whitespace, control characters or, for a
    /// guest token, anything outside `[A-Za-z0-9-]` after the prefix.
    #[error("{kind} contains invalid characters")]
    InvalidCharacters {
        /// Which identifier was being validated.
        kind: &'static str,
    },

    /// A guest token without [`GUEST_TOKEN_PREFIX`].
    #[error("guest token must start with '{prefix}'", prefix = GUEST_TOKEN_PREFIX)]
    MissingPrefix,

    /// A user id that is also a well-formed guest token.
    #[error("user id must not have the shape of a guest token")]
    ReservedForGuests,
}

fn validate_length(kind: &'static str, value: &str) -> Result<(), IdentityValidationError> {
    if value.is_empty() {
        return Err(IdentityValidationError::Empty { kind });
    }
    if value.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(IdentityValidationError::TooLong { kind });
    }
    Ok(())
}

// =============================================================================
// UserId
// =============================================================================

/// Stable identifier of an authenticated user (the account e-mail).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a `UserId` after validating it.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityValidationError`] when the value is empty, too long,
    /// contains whitespace or control characters, or is shaped like a guest
    /// token. User ids and guest tokens share the `owner_id` column, so the
    /// two sets must stay disjoint.
    pub fn parse(value: impl Into<String>) -> Result<Self, IdentityValidationError> {
        let value = value.into();
        validate_length("user id", &value)?;
        if value
            .chars()
            .any(|character| character.is_control() || character.is_whitespace())
        {
            return Err(IdentityValidationError::InvalidCharacters { kind: "user id" });
        }
        if GuestToken::validate(&value).is_ok() {
            return Err(IdentityValidationError::ReservedForGuests);
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

// =============================================================================
// GuestToken
// =============================================================================

/// Opaque client-held credential that identifies an anonymous visitor.
///
/// Tokens are minted as `guest_<uuid-v4>`. A token presented by a client
/// must be [`GUEST_TOKEN_PREFIX`] followed by ASCII letters, digits or `-`;
/// no user id can take that shape.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestToken(String);

impl GuestToken {
    /// Mints a fresh, random guest token.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{GUEST_TOKEN_PREFIX}{}", Uuid::new_v4()))
    }

    /// Accepts a token presented by a client.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityValidationError`] if the token is malformed.
    pub fn parse(value: impl Into<String>) -> Result<Self, IdentityValidationError> {
        let value = value.into();
        Self::validate(&value)?;
        Ok(Self(value))
    }

    fn validate(value: &str) -> Result<(), IdentityValidationError> {
        validate_length("guest token", value)?;
        let body = value
            .strip_prefix(GUEST_TOKEN_PREFIX)
            .ok_or(IdentityValidationError::MissingPrefix)?;
        if body.is_empty() {
            return Err(IdentityValidationError::Empty { kind: "guest token" });
        }
        if !body
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || byte == b'-')
        {
            return Err(IdentityValidationError::InvalidCharacters { kind: "guest token" });
        }
        Ok(())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short, log-safe rendering of the token.
    ///
    /// The full token is a bearer credential and never goes to the logs.
    #[must_use]
    pub fn redacted(&self) -> String {
        let visible: String = self.0.chars().take(GUEST_TOKEN_PREFIX.len() + 4).collect();
        format!("{visible}…")
    }
}

impl fmt::Debug for GuestToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_tuple("GuestToken")
            .field(&self.redacted())
            .finish()
    }
}

impl fmt::Display for GuestToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

// =============================================================================
// OwnerId
// =============================================================================

/// The value stored in the `owner_id` column of every owned record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Rebuilds an owner id read back from storage.
    #[must_use]
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl From<&UserId> for OwnerId {
    fn from(user: &UserId) -> Self {
        Self(user.0.clone())
    }
}

impl From<&GuestToken> for OwnerId {
    fn from(token: &GuestToken) -> Self {
        Self(token.0.clone())
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

// =============================================================================
// OwnerIdentity
// =============================================================================

/// The canonical owner of a request, resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum OwnerIdentity {
    /// An authenticated user.
    User(UserId),
    /// An anonymous visitor.
    Guest(GuestToken),
}

impl OwnerIdentity {
    /// The `owner_id` value records owned by this identity carry.
    #[must_use]
    pub fn owner_id(&self) -> OwnerId {
        match self {
            Self::User(user) => OwnerId::from(user),
            Self::Guest(token) => OwnerId::from(token),
        }
    }

    #[must_use]
    pub const fn is_user(&self) -> bool {
        matches!(self, Self::User(_))
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Guest(_) => "guest",
        }
    }
}

// =============================================================================
// AuthenticatedUser
// =============================================================================

/// The authenticated principal behind a valid session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub name: Option<String>,
}

impl AuthenticatedUser {
    #[must_use]
    pub const fn new(id: UserId) -> Self {
        Self { id, name: None }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
