use crate::auth::CurrentUser;
use crate::error::{AppError, AppResult};
use crate::models::{Id, NewPower};
use crate::service::powers;
use crate::SharedStore;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Deserialize, Debug)]
pub struct PowerIdQuery {
    #[serde(rename = "powerId")]
    power_id: Option<Id>,
}

pub async fn list_powers(
    path: Result<Path<Id>, PathRejection>,
    Extension(store): Extension<SharedStore>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Value>> {
    let Path(character_id) = path?;
    let list = powers::list(store.as_ref(), character_id, current_user.user_id).await?;
    Ok(Json(json!({ "powers": list })))
}

pub async fn create_power(
    path: Result<Path<Id>, PathRejection>,
    Extension(store): Extension<SharedStore>,
    Extension(current_user): Extension<CurrentUser>,
    body: Result<Json<NewPower>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let Path(character_id) = path?;
    let Json(input) = body?;
    let power = powers::create(store.as_ref(), character_id, current_user.user_id, input).await?;
    Ok(Json(json!({ "success": true, "id": power.id, "power": power })))
}

/// `DELETE /api/characters/:id/powers?powerId=N`
pub async fn delete_power(
    path: Result<Path<Id>, PathRejection>,
    query: Result<Query<PowerIdQuery>, QueryRejection>,
    Extension(store): Extension<SharedStore>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Value>> {
    let Path(character_id) = path?;
    let Query(query) = query?;
    let power_id = query
        .power_id
        .ok_or_else(|| AppError::BadRequest("Power ID required".to_string()))?;
    powers::delete(store.as_ref(), power_id, character_id, current_user.user_id).await?;
    Ok(Json(json!({ "success": true })))
}
