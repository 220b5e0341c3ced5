use crate::{
    auth::{CurrentUser, SessionManager, SharedSessions, COOKIE_NAME},
    error::AppError,
    SharedStore,
};
use axum::{
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;

/// Create a HashMap with the content of the cookie headers.
fn get_cookie_map(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|cookie_str| cookie_str.split(';'))
        .filter_map(|cookie_pair| {
            let (name, value) = cookie_pair.trim().split_once('=')?;
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

/// Resolves the caller from the session cookie, or rejects with 401.
///
/// Missing, forged and expired cookies all get the same response.
pub async fn auth<B>(
    mut req: Request<B>,
    next: Next<B>,
    sessions: SharedSessions,
) -> Result<Response, AppError> {
    if let Some(current_user) = session_user(req.headers(), &sessions) {
        req.extensions_mut().insert(current_user);
        Ok(next.run(req).await)
    } else {
        tracing::debug!("unauthorized request to {}", req.uri());
        Err(AppError::Unauthorized)
    }
}

/// Lets the request through only for administrators.
///
/// Must run after [`auth`].
pub async fn require_admin<B>(
    req: Request<B>,
    next: Next<B>,
    store: SharedStore,
) -> Result<Response, AppError> {
    let current_user = req
        .extensions()
        .get::<CurrentUser>()
        .copied()
        .ok_or(AppError::Unauthorized)?;
    let user = store
        .user_by_id(current_user.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    if !user.is_admin {
        tracing::info!(user_id = user.id, "non-admin tried {}", req.uri());
        return Err(AppError::Forbidden(
            "Administrator access required".to_string(),
        ));
    }
    Ok(next.run(req).await)
}

/// Reads the session cookie outside of the middleware.
pub(crate) fn session_user(
    headers: &HeaderMap,
    sessions: &SessionManager,
) -> Option<CurrentUser> {
    get_cookie_map(headers)
        .get(COOKIE_NAME)
        .and_then(|token| sessions.verify(token))
        .map(|user_id| CurrentUser { user_id })
}
