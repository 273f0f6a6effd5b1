//! Guest and session cookies.

use std::sync::Arc;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::application::{GuestTokenStore, TokenClearError};
use crate::domain::GuestToken;
use crate::infrastructure::AppConfig;

/// Name of the cookie carrying the guest token.
pub const GUEST_COOKIE_NAME: &str = "guest_session_id";

// =============================================================================
// CookieSettings
// =============================================================================

/// Cookie policy shared by the guest token layer and the handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSettings {
    pub session_cookie_names: Arc<[String]>,
    pub guest_max_age_days: u32,
    pub secure: bool,
}

impl CookieSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            session_cookie_names: config.session_cookie_names.clone().into(),
            guest_max_age_days: config.guest_cookie_max_age_days,
            secure: config.app_env.is_production(),
        }
    }

    /// Whether the jar carries any session cookie. Presence only; the
    /// session itself is validated by the handlers.
    #[must_use]
    pub fn has_session_cookie(&self, jar: &CookieJar) -> bool {
        self.session_cookie(jar).is_some()
    }

    /// Value of the first configured session cookie present in the jar.
    #[must_use]
    pub fn session_cookie(&self, jar: &CookieJar) -> Option<String> {
        self.session_cookie_names
            .iter()
            .find_map(|name| jar.get(name))
            .map(|cookie| cookie.value().to_string())
    }

    /// The long-lived `Set-Cookie` value for a freshly minted token.
    #[must_use]
    pub fn guest_cookie(&self, token: &GuestToken) -> Cookie<'static> {
        Cookie::build((GUEST_COOKIE_NAME, token.as_str().to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(time::Duration::days(i64::from(self.guest_max_age_days)))
            .build()
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Reads the guest token from a jar. Malformed values count as absent.
#[must_use]
pub fn guest_token(jar: &CookieJar) -> Option<GuestToken> {
    jar.get(GUEST_COOKIE_NAME)
        .and_then(|cookie| GuestToken::parse(cookie.value()).ok())
}

// =============================================================================
// CookieGuestTokenStore
// =============================================================================

/// [`GuestTokenStore`] over the request's cookie jar.
///
/// Clearing queues a removal cookie; return [`CookieGuestTokenStore::into_jar`]
/// from the handler to send it.
#[derive(Debug, Clone)]
pub struct CookieGuestTokenStore {
    jar: CookieJar,
}

impl CookieGuestTokenStore {
    #[must_use]
    pub const fn new(jar: CookieJar) -> Self {
        Self { jar }
    }

    #[must_use]
    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

impl GuestTokenStore for CookieGuestTokenStore {
    fn current(&self) -> Option<GuestToken> {
        guest_token(&self.jar)
    }

    fn clear(&mut self) -> Result<(), TokenClearError> {
        if self.jar.get(GUEST_COOKIE_NAME).is_none() {
            return Err(TokenClearError(format!("no {GUEST_COOKIE_NAME} cookie to remove")));
        }
        let jar = std::mem::take(&mut self.jar);
        self.jar = jar.remove(Cookie::build(GUEST_COOKIE_NAME).path("/"));
        Ok(())
    }
}
