//! HTTP surface: router, handlers, the guest token issuer and cookie
//! handling.

pub mod cookies;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use cookies::{CookieGuestTokenStore, CookieSettings, GUEST_COOKIE_NAME};
pub use error::{ApiError, ErrorResponse};
pub use middleware::GuestTokenLayer;
pub use routes::create_router;
pub use state::AppState;
