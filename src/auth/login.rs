use crate::{
    auth::{middleware::session_user, SessionManager, SharedSessions},
    error::{AppError, AppResult},
    models::Id,
    service::users,
    SharedStore,
};
use axum::{
    extract::rejection::JsonRejection,
    http::{
        header::{self, HeaderMap, HeaderValue},
        StatusCode,
    },
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

/// Body of a login request.
#[derive(Deserialize, Debug)]
pub struct LogIn {
    /// Login name. Also read from `email`.
    #[serde(alias = "email")]
    pub username: Option<String>,
    /// Plaintext password.
    pub password: Option<String>,
}

fn set_cookie(value: &str) -> AppResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(value)
        .map_err(|e| AppError::Internal(format!("bad cookie header: {e}")))?;
    headers.insert(header::SET_COOKIE, value);
    Ok(headers)
}

/// Headers that start a session for `user_id`.
pub(crate) fn session_headers(sessions: &SessionManager, user_id: Id) -> AppResult<HeaderMap> {
    let token = sessions
        .issue(user_id)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    tracing::debug!(user_id, "issuing session cookie");
    set_cookie(&sessions.cookie(&token))
}

/// Checks credentials and sets the session cookie.
pub async fn login(
    Extension(store): Extension<SharedStore>,
    Extension(sessions): Extension<SharedSessions>,
    body: Result<Json<LogIn>, JsonRejection>,
) -> AppResult<(StatusCode, HeaderMap, Json<Value>)> {
    let Json(log_in) = body?;
    let user = users::authenticate(store.as_ref(), log_in.username, log_in.password).await?;
    let headers = session_headers(&sessions, user.id)?;
    Ok((
        StatusCode::OK,
        headers,
        Json(json!({ "success": true, "userId": user.id })),
    ))
}

/// Clears the session cookie. A copied token stays valid until it expires.
pub async fn logout(
    Extension(sessions): Extension<SharedSessions>,
) -> AppResult<(StatusCode, HeaderMap, Json<Value>)> {
    let headers = set_cookie(&sessions.clear_cookie())?;
    Ok((StatusCode::OK, headers, Json(json!({ "success": true }))))
}

/// The logged in user, or `null`. Never fails on a bad session.
pub async fn current_session(
    headers: HeaderMap,
    Extension(store): Extension<SharedStore>,
    Extension(sessions): Extension<SharedSessions>,
) -> Json<Value> {
    let user = match session_user(&headers, &sessions) {
        Some(current_user) => users::find(store.as_ref(), current_user.user_id)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("could not load session user: {e}");
                None
            }),
        None => None,
    };
    Json(json!({ "user": user }))
}
