use super::{
    CharacterInsert, CharacterPatch, CharacterRow, CharacterSummaryRow, ConditionInsert,
    ConditionRow, PowerInsert, PowerRow, RaceRow, RaceWrite, Store, StorageError, StorageResult,
    UserInsert, UserRow,
};
use crate::models::Id;
use axum::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

// Last id handed out per table, like a SERIAL column.
#[derive(Default)]
struct Sequences {
    users: Id,
    characters: Id,
    powers: Id,
    conditions: Id,
    races: Id,
}

fn next_id(last: &mut Id) -> Id {
    *last += 1;
    *last
}

#[derive(Default)]
struct Tables {
    sequences: Sequences,
    users: BTreeMap<Id, UserRow>,
    characters: BTreeMap<Id, CharacterRow>,
    powers: BTreeMap<Id, PowerRow>,
    conditions: BTreeMap<Id, ConditionRow>,
    races: BTreeMap<Id, RaceRow>,
}

impl Tables {
    fn owns(&self, character_id: Id, owner: Id) -> bool {
        self.characters
            .get(&character_id)
            .map_or(false, |c| c.user_id == owner)
    }
}

/// [`Store`] kept in process memory. Each table numbers its rows from 1.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    /// Overwrites the raw blob columns of a character.
    #[cfg(test)]
    pub(crate) async fn corrupt_character(&self, id: Id, ability_scores: &str) {
        if let Some(row) = self.tables.lock().await.characters.get_mut(&id) {
            row.ability_scores = ability_scores.to_string();
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: UserInsert) -> StorageResult<UserRow> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(StorageError::Conflict);
        }
        let row = UserRow {
            id: next_id(&mut tables.sequences.users),
            username: user.username,
            name: user.name,
            password: user.password,
            is_admin: user.is_admin,
        };
        tables.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn user_by_username(&self, username: &str) -> StorageResult<Option<UserRow>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn user_by_id(&self, id: Id) -> StorageResult<Option<UserRow>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn list_characters(&self, owner: Id) -> StorageResult<Vec<CharacterSummaryRow>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .characters
            .values()
            .filter(|c| c.user_id == owner)
            .map(|c| CharacterSummaryRow {
                id: c.id,
                name: c.name.clone(),
                race: c.race.clone(),
                class: c.class.clone(),
                level: c.level,
            })
            .collect())
    }

    async fn insert_character(
        &self,
        owner: Id,
        character: CharacterInsert,
    ) -> StorageResult<CharacterRow> {
        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(&owner) {
            return Err(StorageError::Corrupt(format!("no user with id {owner}")));
        }
        let row = CharacterRow {
            id: next_id(&mut tables.sequences.characters),
            user_id: owner,
            name: character.name,
            race: character.race,
            class: character.class,
            level: character.level,
            ability_scores: character.ability_scores,
            defenses: character.defenses,
            health: character.health,
        };
        tables.characters.insert(row.id, row.clone());
        Ok(row)
    }

    async fn character(&self, id: Id, owner: Id) -> StorageResult<Option<CharacterRow>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .characters
            .get(&id)
            .filter(|c| c.user_id == owner)
            .cloned())
    }

    async fn update_character(
        &self,
        id: Id,
        owner: Id,
        patch: CharacterPatch,
    ) -> StorageResult<bool> {
        let mut tables = self.tables.lock().await;
        let row = match tables.characters.get_mut(&id) {
            Some(row) if row.user_id == owner => row,
            _ => return Ok(false),
        };
        if let Some(name) = patch.name {
            row.name = name;
        }
        if let Some(race) = patch.race {
            row.race = race;
        }
        if let Some(class) = patch.class {
            row.class = class;
        }
        if let Some(level) = patch.level {
            row.level = level;
        }
        if let Some(ability_scores) = patch.ability_scores {
            row.ability_scores = ability_scores;
        }
        if let Some(defenses) = patch.defenses {
            row.defenses = defenses;
        }
        if let Some(health) = patch.health {
            row.health = health;
        }
        Ok(true)
    }

    async fn delete_character(&self, id: Id, owner: Id) -> StorageResult<bool> {
        let mut tables = self.tables.lock().await;
        if !tables.owns(id, owner) {
            return Ok(false);
        }
        tables.characters.remove(&id);
        tables.powers.retain(|_, p| p.character_id != id);
        tables.conditions.retain(|_, c| c.character_id != id);
        Ok(true)
    }

    async fn list_powers(&self, character_id: Id, owner: Id) -> StorageResult<Vec<PowerRow>> {
        let tables = self.tables.lock().await;
        if !tables.owns(character_id, owner) {
            return Ok(vec![]);
        }
        Ok(tables
            .powers
            .values()
            .filter(|p| p.character_id == character_id)
            .cloned()
            .collect())
    }

    async fn insert_power(
        &self,
        character_id: Id,
        owner: Id,
        power: PowerInsert,
    ) -> StorageResult<Option<PowerRow>> {
        let mut tables = self.tables.lock().await;
        if !tables.owns(character_id, owner) {
            return Ok(None);
        }
        let row = PowerRow {
            id: next_id(&mut tables.sequences.powers),
            character_id,
            name: power.name,
            kind: power.kind,
            action_type: power.action_type,
            range: power.range,
            attack: power.attack,
            hit: power.hit,
            miss: power.miss,
            effect: power.effect,
        };
        tables.powers.insert(row.id, row.clone());
        Ok(Some(row))
    }

    async fn delete_power(&self, id: Id, character_id: Id, owner: Id) -> StorageResult<bool> {
        let mut tables = self.tables.lock().await;
        if !tables.owns(character_id, owner) {
            return Ok(false);
        }
        let matches = tables
            .powers
            .get(&id)
            .map_or(false, |p| p.character_id == character_id);
        if matches {
            tables.powers.remove(&id);
        }
        Ok(matches)
    }

    async fn list_conditions(
        &self,
        character_id: Id,
        owner: Id,
    ) -> StorageResult<Vec<ConditionRow>> {
        let tables = self.tables.lock().await;
        if !tables.owns(character_id, owner) {
            return Ok(vec![]);
        }
        Ok(tables
            .conditions
            .values()
            .filter(|c| c.character_id == character_id)
            .cloned()
            .collect())
    }

    async fn insert_condition(
        &self,
        character_id: Id,
        owner: Id,
        condition: ConditionInsert,
    ) -> StorageResult<Option<ConditionRow>> {
        let mut tables = self.tables.lock().await;
        if !tables.owns(character_id, owner) {
            return Ok(None);
        }
        let row = ConditionRow {
            id: next_id(&mut tables.sequences.conditions),
            character_id,
            name: condition.name,
            duration: condition.duration,
            effect_description: condition.effect_description,
        };
        tables.conditions.insert(row.id, row.clone());
        Ok(Some(row))
    }

    async fn delete_condition(
        &self,
        id: Id,
        character_id: Id,
        owner: Id,
    ) -> StorageResult<bool> {
        let mut tables = self.tables.lock().await;
        if !tables.owns(character_id, owner) {
            return Ok(false);
        }
        let matches = tables
            .conditions
            .get(&id)
            .map_or(false, |c| c.character_id == character_id);
        if matches {
            tables.conditions.remove(&id);
        }
        Ok(matches)
    }

    async fn list_races(&self) -> StorageResult<Vec<RaceRow>> {
        let tables = self.tables.lock().await;
        let mut races: Vec<RaceRow> = tables.races.values().cloned().collect();
        races.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(races)
    }

    async fn race(&self, id: Id) -> StorageResult<Option<RaceRow>> {
        Ok(self.tables.lock().await.races.get(&id).cloned())
    }

    async fn insert_race(&self, race: RaceWrite) -> StorageResult<RaceRow> {
        let mut tables = self.tables.lock().await;
        let id = next_id(&mut tables.sequences.races);
        let row = race.into_row(id);
        tables.races.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_race(&self, id: Id, race: RaceWrite) -> StorageResult<Option<RaceRow>> {
        let mut tables = self.tables.lock().await;
        match tables.races.get_mut(&id) {
            Some(existing) => {
                *existing = race.into_row(id);
                Ok(Some(existing.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_race(&self, id: Id) -> StorageResult<bool> {
        Ok(self.tables.lock().await.races.remove(&id).is_some())
    }
}
