use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use super::current_user;
use crate::api::cookies::CookieGuestTokenStore;
use crate::api::state::AppState;
use crate::application::{ActionResult, MERGE_FAILED_MESSAGE, MergeError, MergeOutcome};
use crate::infrastructure::{MergeBackend, NoteRepository, SessionDirectory};

/// Runs the merge for the signed-in caller.
///
/// Responds 200 on success, 401 for an unauthenticated caller and 500 for
/// everything else, always with an [`ActionResult`] body. A cleared guest
/// token goes out as a removal `Set-Cookie`.
pub async fn merge_guest_data<Store, Sessions>(
    State(state): State<AppState<Store, Sessions>>,
    jar: CookieJar,
) -> Response
where
    Store: MergeBackend + NoteRepository,
    Sessions: SessionDirectory,
{
    let user = match current_user(&state, &jar).await {
        Ok(user) => user,
        Err(error) => {
            tracing::error!(error = %error, "Session lookup failed");
            let body = ActionResult::<MergeOutcome>::Failure(MERGE_FAILED_MESSAGE.to_string());
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
        }
    };

    let mut tokens = CookieGuestTokenStore::new(jar);
    let result = state.orchestrator.try_merge(user.as_ref(), &mut tokens).await;

    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(MergeError::AuthenticationRequired) => StatusCode::UNAUTHORIZED,
        Err(MergeError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, tokens.into_jar(), Json(ActionResult::from(result))).into_response()
}
