use crate::error::AppResult;
use crate::models::{Id, RaceInput};
use crate::service::races;
use crate::SharedStore;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path,
    },
    Extension, Json,
};
use serde_json::{json, Value};

pub async fn list_races(Extension(store): Extension<SharedStore>) -> AppResult<Json<Value>> {
    let list = races::list(store.as_ref()).await?;
    Ok(Json(json!({ "races": list })))
}

pub async fn get_race(
    path: Result<Path<Id>, PathRejection>,
    Extension(store): Extension<SharedStore>,
) -> AppResult<Json<Value>> {
    let Path(id) = path?;
    let race = races::get(store.as_ref(), id).await?;
    Ok(Json(json!({ "race": race })))
}

// The handlers below sit behind the admin gate.

pub async fn create_race(
    Extension(store): Extension<SharedStore>,
    body: Result<Json<RaceInput>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let Json(input) = body?;
    let race = races::create(store.as_ref(), input).await?;
    Ok(Json(json!({ "success": true, "race": race })))
}

pub async fn update_race(
    path: Result<Path<Id>, PathRejection>,
    Extension(store): Extension<SharedStore>,
    body: Result<Json<RaceInput>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let Path(id) = path?;
    let Json(input) = body?;
    let race = races::update(store.as_ref(), id, input).await?;
    Ok(Json(json!({ "success": true, "race": race })))
}

pub async fn delete_race(
    path: Result<Path<Id>, PathRejection>,
    Extension(store): Extension<SharedStore>,
) -> AppResult<Json<Value>> {
    let Path(id) = path?;
    races::delete(store.as_ref(), id).await?;
    Ok(Json(json!({ "success": true })))
}
