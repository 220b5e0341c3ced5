use crate::auth::{login::session_headers, SharedSessions};
use crate::error::AppResult;
use crate::service::users;
use crate::SharedStore;
use axum::{
    extract::rejection::JsonRejection,
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

/// Body of a registration request.
#[derive(Deserialize, Debug)]
pub struct SignUp {
    /// Login name. Also read from `email`.
    #[serde(alias = "email")]
    pub username: Option<String>,
    /// Plaintext password.
    pub password: Option<String>,
    /// Display name.
    pub name: Option<String>,
}

/// Creates an account and logs it in.
pub async fn register(
    Extension(store): Extension<SharedStore>,
    Extension(sessions): Extension<SharedSessions>,
    body: Result<Json<SignUp>, JsonRejection>,
) -> AppResult<(StatusCode, HeaderMap, Json<Value>)> {
    let Json(sign_up) = body?;
    let user = users::register(
        store.as_ref(),
        sign_up.username,
        sign_up.password,
        sign_up.name,
        false,
    )
    .await?;
    let headers = session_headers(&sessions, user.id)?;
    Ok((
        StatusCode::OK,
        headers,
        Json(json!({ "success": true, "userId": user.id })),
    ))
}
