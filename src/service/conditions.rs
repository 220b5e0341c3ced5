//! Conditions attached to a character.

use crate::error::{AppError, AppResult};
use crate::models::{Condition, Id, NewCondition};
use crate::service::characters::{ensure_owned, not_found};
use crate::storage::{ConditionInsert, ConditionRow, Store};

impl From<ConditionRow> for Condition {
    fn from(row: ConditionRow) -> Self {
        Condition {
            id: row.id,
            character_id: row.character_id,
            name: row.name,
            duration: row.duration,
            effect_description: row.effect_description,
        }
    }
}

/// Conditions of a character owned by `owner`.
pub async fn list(store: &dyn Store, character_id: Id, owner: Id) -> AppResult<Vec<Condition>> {
    ensure_owned(store, character_id, owner).await?;
    let rows = store.list_conditions(character_id, owner).await?;
    Ok(rows.into_iter().map(Condition::from).collect())
}

/// Adds a condition to a character owned by `owner`.
pub async fn create(
    store: &dyn Store,
    character_id: Id,
    owner: Id,
    input: NewCondition,
) -> AppResult<Condition> {
    let name = input
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Name is required".to_string()))?;
    let row = store
        .insert_condition(
            character_id,
            owner,
            ConditionInsert {
                name,
                duration: input.duration,
                effect_description: input.effect_description,
            },
        )
        .await?
        .ok_or_else(not_found)?;
    Ok(row.into())
}

/// Deletes a condition. Both ids must match and the character must belong to `owner`.
pub async fn delete(store: &dyn Store, id: Id, character_id: Id, owner: Id) -> AppResult<()> {
    if !store.delete_condition(id, character_id, owner).await? {
        return Err(AppError::NotFound("Condition not found".to_string()));
    }
    Ok(())
}
