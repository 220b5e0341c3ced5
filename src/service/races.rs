//! The shared race reference table.

use crate::error::{AppError, AppResult};
use crate::models::{Blob, Id, Race, RaceInput, RaceTrait};
use crate::storage::{RaceRow, RaceWrite, Store};

fn not_found() -> AppError {
    AppError::NotFound("Race not found".to_string())
}

fn decode_row(row: RaceRow) -> AppResult<Race> {
    let traits = Vec::<RaceTrait>::decode(&row.traits).map_err(|e| {
        AppError::Internal(format!("race {} has a bad traits column: {e}", row.id))
    })?;
    Ok(Race {
        id: row.id,
        name: row.name,
        description_short: row.description_short,
        description_long: row.description_long,
        average_height_min: row.average_height_min,
        average_height_max: row.average_height_max,
        average_weight_min: row.average_weight_min,
        average_weight_max: row.average_weight_max,
        ability_scores: row.ability_scores,
        size: row.size,
        speed: row.speed,
        vision: row.vision,
        traits,
    })
}

fn encode_input(input: RaceInput) -> AppResult<RaceWrite> {
    let name = input
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Name is required".to_string()))?;
    let traits = input
        .traits
        .encode()
        .map_err(|e| AppError::BadRequest(format!("traits: {e}")))?;
    Ok(RaceWrite {
        name,
        description_short: input.description_short,
        description_long: input.description_long,
        average_height_min: input.average_height_min,
        average_height_max: input.average_height_max,
        average_weight_min: input.average_weight_min,
        average_weight_max: input.average_weight_max,
        ability_scores: input.ability_scores,
        size: input.size,
        speed: input.speed,
        vision: input.vision,
        traits,
    })
}

/// Every race, by name.
pub async fn list(store: &dyn Store) -> AppResult<Vec<Race>> {
    store
        .list_races()
        .await?
        .into_iter()
        .map(decode_row)
        .collect()
}

/// One race.
pub async fn get(store: &dyn Store, id: Id) -> AppResult<Race> {
    decode_row(store.race(id).await?.ok_or_else(not_found)?)
}

/// Adds a race to the reference table.
pub async fn create(store: &dyn Store, input: RaceInput) -> AppResult<Race> {
    let row = store.insert_race(encode_input(input)?).await?;
    tracing::info!(race_id = row.id, "created race {}", row.name);
    decode_row(row)
}

/// Replaces every field of a race.
pub async fn update(store: &dyn Store, id: Id, input: RaceInput) -> AppResult<Race> {
    let row = store
        .update_race(id, encode_input(input)?)
        .await?
        .ok_or_else(not_found)?;
    decode_row(row)
}

/// Removes a race.
pub async fn delete(store: &dyn Store, id: Id) -> AppResult<()> {
    if !store.delete_race(id).await? {
        return Err(not_found());
    }
    tracing::info!(race_id = id, "deleted race");
    Ok(())
}
