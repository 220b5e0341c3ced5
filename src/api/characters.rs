use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::models::{CharacterChanges, Id, NewCharacter};
use crate::service::characters;
use crate::SharedStore;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path,
    },
    Extension, Json,
};
use serde_json::{json, Value};

pub async fn list_characters(
    Extension(store): Extension<SharedStore>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Value>> {
    let list = characters::list(store.as_ref(), current_user.user_id).await?;
    Ok(Json(json!({ "characters": list })))
}

pub async fn create_character(
    Extension(store): Extension<SharedStore>,
    Extension(current_user): Extension<CurrentUser>,
    body: Result<Json<NewCharacter>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let Json(input) = body?;
    let character = characters::create(store.as_ref(), current_user.user_id, input).await?;
    Ok(Json(
        json!({ "success": true, "id": character.id, "character": character }),
    ))
}

pub async fn get_character(
    path: Result<Path<Id>, PathRejection>,
    Extension(store): Extension<SharedStore>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Value>> {
    let Path(id) = path?;
    let character = characters::get(store.as_ref(), id, current_user.user_id).await?;
    Ok(Json(json!({ "character": character })))
}

/// Partial update: only the fields present in the body are written.
pub async fn update_character(
    path: Result<Path<Id>, PathRejection>,
    Extension(store): Extension<SharedStore>,
    Extension(current_user): Extension<CurrentUser>,
    body: Result<Json<CharacterChanges>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let Path(id) = path?;
    let Json(changes) = body?;
    characters::update(store.as_ref(), id, current_user.user_id, changes).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn delete_character(
    path: Result<Path<Id>, PathRejection>,
    Extension(store): Extension<SharedStore>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Value>> {
    let Path(id) = path?;
    characters::delete(store.as_ref(), id, current_user.user_id).await?;
    Ok(Json(json!({ "success": true })))
}
