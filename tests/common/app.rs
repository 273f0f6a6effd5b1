//! In-process test application.

use axum::Router;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, StatusCode};
use guest_merge::api::{AppState, CookieSettings, GUEST_COOKIE_NAME, create_router};
use guest_merge::domain::{AuthenticatedUser, UserId};
use guest_merge::infrastructure::{InMemorySessionDirectory, InMemoryStore};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const SESSION_COOKIE_NAME: &str = "authjs.session-token";

pub struct TestApp {
    pub router: Router,
    pub store: InMemoryStore,
    pub sessions: InMemorySessionDirectory,
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookies: Vec<String>,
    pub body: Value,
}

impl TestResponse {
    /// The `name=value` pair of the guest cookie set by this response.
    pub fn guest_cookie(&self) -> Option<String> {
        let prefix = format!("{GUEST_COOKIE_NAME}=");
        self.set_cookies
            .iter()
            .find(|cookie| cookie.starts_with(&prefix))
            .and_then(|cookie| cookie.split(';').next())
            .map(ToString::to_string)
    }
}

impl TestApp {
    pub fn new() -> Self {
        let store = InMemoryStore::new();
        let sessions = InMemorySessionDirectory::new();
        let state = AppState::new(store.clone(), sessions.clone(), CookieSettings::default());

        Self {
            router: create_router(state),
            store,
            sessions,
        }
    }

    /// Registers a live session and returns its `Cookie` pair.
    pub async fn sign_in(&self, email: &str) -> String {
        let session_token = format!("session-{}", Uuid::new_v4().simple());
        let user = AuthenticatedUser::new(UserId::parse(email).unwrap());
        self.sessions.register(session_token.clone(), user).await;
        format!("{SESSION_COOKIE_NAME}={session_token}")
    }

    /// Starts an anonymous visit and returns the issued guest cookie pair.
    pub async fn visit_as_guest(&self) -> String {
        self.get("/identity", None)
            .await
            .guest_cookie()
            .expect("guest cookie should be issued")
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, cookie, None).await
    }

    pub async fn post(&self, uri: &str, cookie: Option<&str>, body: Option<Value>) -> TestResponse {
        self.send(Method::POST, uri, cookie, body).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|value| value.to_str().unwrap().to_string())
            .collect();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse {
            status,
            set_cookies,
            body,
        }
    }
}

/// Joins cookie pairs into one `Cookie` header value.
pub fn cookies(pairs: &[&str]) -> String {
    pairs.join("; ")
}
