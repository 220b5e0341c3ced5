use crate::auth::CurrentUser;
use crate::error::{AppError, AppResult};
use crate::models::{Id, NewCondition};
use crate::service::conditions;
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
pub struct ConditionIdQuery {
    #[serde(rename = "conditionId")]
    condition_id: Option<Id>,
}

pub async fn list_conditions(
    path: Result<Path<Id>, PathRejection>,
    Extension(store): Extension<SharedStore>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Value>> {
    let Path(character_id) = path?;
    let list = conditions::list(store.as_ref(), character_id, current_user.user_id).await?;
    Ok(Json(json!({ "conditions": list })))
}

pub async fn create_condition(
    path: Result<Path<Id>, PathRejection>,
    Extension(store): Extension<SharedStore>,
    Extension(current_user): Extension<CurrentUser>,
    body: Result<Json<NewCondition>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let Path(character_id) = path?;
    let Json(input) = body?;
    let condition =
        conditions::create(store.as_ref(), character_id, current_user.user_id, input).await?;
    Ok(Json(
        json!({ "success": true, "id": condition.id, "condition": condition }),
    ))
}

/// `DELETE /api/characters/:id/conditions?conditionId=N`
pub async fn delete_condition(
    path: Result<Path<Id>, PathRejection>,
    query: Result<Query<ConditionIdQuery>, QueryRejection>,
    Extension(store): Extension<SharedStore>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Value>> {
    let Path(character_id) = path?;
    let Query(query) = query?;
    let condition_id = query
        .condition_id
        .ok_or_else(|| AppError::BadRequest("Condition ID required".to_string()))?;
    conditions::delete(
        store.as_ref(),
        condition_id,
        character_id,
        current_user.user_id,
    )
    .await?;
    Ok(Json(json!({ "success": true })))
}
