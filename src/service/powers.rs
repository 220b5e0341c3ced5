//! Powers on a character sheet.

use crate::error::{AppError, AppResult};
use crate::models::{Id, NewPower, Power, PowerType};
use crate::service::characters::ensure_owned;
use crate::storage::{PowerInsert, PowerRow, Store, StorageError};

const DEFAULT_ACTION_TYPE: &str = "Standard";

impl TryFrom<PowerRow> for Power {
    type Error = StorageError;

    fn try_from(row: PowerRow) -> Result<Self, Self::Error> {
        let kind = row
            .kind
            .parse::<PowerType>()
            .map_err(|e| StorageError::Corrupt(format!("power {}: {e}", row.id)))?;
        Ok(Power {
            id: row.id,
            character_id: row.character_id,
            name: row.name,
            kind,
            action_type: row.action_type,
            range: row.range,
            attack: row.attack,
            hit: row.hit,
            miss: row.miss,
            effect: row.effect,
        })
    }
}

/// Powers of a character owned by `owner`.
pub async fn list(store: &dyn Store, character_id: Id, owner: Id) -> AppResult<Vec<Power>> {
    ensure_owned(store, character_id, owner).await?;
    let rows = store.list_powers(character_id, owner).await?;
    Ok(rows
        .into_iter()
        .map(Power::try_from)
        .collect::<Result<Vec<_>, _>>()?)
}

/// Adds a power to a character owned by `owner`.
pub async fn create(
    store: &dyn Store,
    character_id: Id,
    owner: Id,
    input: NewPower,
) -> AppResult<Power> {
    let name = input
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Name is required".to_string()))?;
    let kind: PowerType = input
        .kind
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|_| {
            AppError::BadRequest("Type must be one of At-Will, Encounter, Daily".to_string())
        })?;
    let insert = PowerInsert {
        name,
        kind: kind.as_str().to_string(),
        action_type: input
            .action_type
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ACTION_TYPE.to_string()),
        range: input.range,
        attack: input.attack,
        hit: input.hit,
        miss: input.miss,
        effect: input.effect,
    };
    let row = store
        .insert_power(character_id, owner, insert)
        .await?
        .ok_or_else(crate::service::characters::not_found)?;
    Ok(Power::try_from(row)?)
}

/// Deletes a power. Both ids must match and the character must belong to `owner`.
pub async fn delete(store: &dyn Store, id: Id, character_id: Id, owner: Id) -> AppResult<()> {
    if !store.delete_power(id, character_id, owner).await? {
        return Err(AppError::NotFound("Power not found".to_string()));
    }
    Ok(())
}
