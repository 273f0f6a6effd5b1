//! Guest token issuer.
//!
//! Runs in front of every handler. A request with neither a session cookie
//! nor a well-formed guest cookie gets a new guest token: the token is added
//! to the request's `Cookie` header so the handler resolves it as the owner,
//! and a long-lived `Set-Cookie` is attached to the response.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, Request, Response, StatusCode};
use axum_extra::extract::cookie::CookieJar;
use futures::future::BoxFuture;
use tower::{Layer, Service};

use crate::api::cookies::{CookieSettings, GUEST_COOKIE_NAME, guest_token};
use crate::domain::GuestToken;

/// Rewrites the `Cookie` header so it carries exactly one guest cookie.
fn replace_guest_cookie(headers: &HeaderMap, token: &GuestToken) -> Option<HeaderValue> {
    let guest_prefix = format!("{GUEST_COOKIE_NAME}=");
    let mut pairs: Vec<String> = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .map(str::trim)
        .filter(|pair| !pair.is_empty() && !pair.starts_with(&guest_prefix))
        .map(ToString::to_string)
        .collect();
    pairs.push(format!("{guest_prefix}{}", token.as_str()));

    HeaderValue::from_str(&pairs.join("; ")).ok()
}

// =============================================================================
// GuestTokenLayer
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct GuestTokenLayer {
    settings: Arc<CookieSettings>,
}

impl GuestTokenLayer {
    #[must_use]
    pub const fn new(settings: Arc<CookieSettings>) -> Self {
        Self { settings }
    }
}

impl<Service> Layer<Service> for GuestTokenLayer {
    type Service = GuestTokenService<Service>;

    fn layer(&self, inner: Service) -> Self::Service {
        GuestTokenService {
            inner,
            settings: Arc::clone(&self.settings),
        }
    }
}

// =============================================================================
// GuestTokenService
// =============================================================================

#[derive(Debug, Clone)]
pub struct GuestTokenService<Service> {
    inner: Service,
    settings: Arc<CookieSettings>,
}

impl<InnerService, RequestBody, ResponseBody> Service<Request<RequestBody>>
    for GuestTokenService<InnerService>
where
    InnerService:
        Service<Request<RequestBody>, Response = Response<ResponseBody>> + Clone + Send + 'static,
    InnerService::Future: Send,
    RequestBody: Send + 'static,
    ResponseBody: Default + Send + 'static,
{
    type Response = Response<ResponseBody>;
    type Error = InnerService::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, context: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(context)
    }

    fn call(&mut self, mut request: Request<RequestBody>) -> Self::Future {
        let jar = CookieJar::from_headers(request.headers());
        let needs_token =
            !self.settings.has_session_cookie(&jar) && guest_token(&jar).is_none();

        let issued = if needs_token {
            let token = GuestToken::generate();
            let set_cookie = HeaderValue::from_str(&self.settings.guest_cookie(&token).to_string());
            let request_cookie = replace_guest_cookie(request.headers(), &token);

            let (Ok(set_cookie), Some(request_cookie)) = (set_cookie, request_cookie) else {
                tracing::error!("Failed to encode guest token cookie");
                return Box::pin(async {
                    let mut response = Response::new(ResponseBody::default());
                    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                    Ok::<_, InnerService::Error>(response)
                });
            };

            request.headers_mut().insert(COOKIE, request_cookie);
            tracing::debug!(guest = %token.redacted(), "Issued guest token");
            Some(set_cookie)
        } else {
            None
        };

        let mut inner = self.inner.clone();

        Box::pin(async move {
            let mut response = inner.call(request).await?;

            if let Some(set_cookie) = issued {
                response.headers_mut().append(SET_COOKIE, set_cookie);
            }

            Ok(response)
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
