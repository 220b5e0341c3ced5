//! Characters owned by a user, with their stat blocks encoded for storage.

use crate::error::{AppError, AppResult};
use crate::models::{
    AbilityScores, Blob, BlobError, Character, CharacterChanges, CharacterSummary, Defenses,
    Health, Id, NewCharacter,
};
use crate::storage::{CharacterInsert, CharacterPatch, CharacterRow, Store};

const DEFAULT_RACE: &str = "Human";
const DEFAULT_CLASS: &str = "Fighter";

pub(crate) fn not_found() -> AppError {
    AppError::NotFound("Character not found".to_string())
}

fn decode_row(row: CharacterRow) -> AppResult<Character> {
    let id = row.id;
    let decode_err = move |field: &str, e: BlobError| {
        AppError::Internal(format!("character {id} has a bad {field} column: {e}"))
    };
    let ability_scores =
        AbilityScores::decode(&row.ability_scores).map_err(|e| decode_err("ability_scores", e))?;
    let defenses = Defenses::decode(&row.defenses).map_err(|e| decode_err("defenses", e))?;
    let health = Health::decode(&row.health).map_err(|e| decode_err("health", e))?;
    Ok(Character {
        id: row.id,
        user_id: row.user_id,
        name: row.name,
        race: row.race,
        class: row.class,
        level: row.level,
        ability_scores,
        defenses,
        health,
    })
}

fn encode_input<T: Blob>(value: &T, field: &str) -> AppResult<String> {
    value
        .encode()
        .map_err(|e| AppError::BadRequest(format!("{field}: {e}")))
}

fn check_level(level: i32) -> AppResult<i32> {
    if level < 1 {
        return Err(AppError::BadRequest("Level must be at least 1".to_string()));
    }
    Ok(level)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// The characters of `owner`.
pub async fn list(store: &dyn Store, owner: Id) -> AppResult<Vec<CharacterSummary>> {
    Ok(store
        .list_characters(owner)
        .await?
        .into_iter()
        .map(|row| CharacterSummary {
            id: row.id,
            name: row.name,
            race: row.race,
            class: row.class,
            level: row.level,
        })
        .collect())
}

/// Creates a character for `owner`, filling unset stat blocks with the baseline.
pub async fn create(store: &dyn Store, owner: Id, input: NewCharacter) -> AppResult<Character> {
    let name = non_blank(input.name)
        .ok_or_else(|| AppError::BadRequest("Name is required".to_string()))?;
    let level = check_level(input.level.unwrap_or(1))?;
    let insert = CharacterInsert {
        name,
        race: non_blank(input.race).unwrap_or_else(|| DEFAULT_RACE.to_string()),
        class: non_blank(input.class).unwrap_or_else(|| DEFAULT_CLASS.to_string()),
        level,
        ability_scores: encode_input(
            &input.ability_scores.unwrap_or_default(),
            "abilityScores",
        )?,
        defenses: encode_input(&input.defenses.unwrap_or_default(), "defenses")?,
        health: encode_input(&input.health.unwrap_or_default(), "health")?,
    };
    let row = store.insert_character(owner, insert).await?;
    tracing::info!(character_id = row.id, user_id = owner, "created character");
    decode_row(row)
}

/// Fetches a character of `owner`.
pub async fn get(store: &dyn Store, id: Id, owner: Id) -> AppResult<Character> {
    let row = store.character(id, owner).await?.ok_or_else(not_found)?;
    decode_row(row)
}

/// Writes the fields present in `changes`. Concurrent updates: last write wins.
pub async fn update(
    store: &dyn Store,
    id: Id,
    owner: Id,
    changes: CharacterChanges,
) -> AppResult<()> {
    if matches!(&changes.name, Some(name) if name.trim().is_empty()) {
        return Err(AppError::BadRequest("Name must not be empty".to_string()));
    }
    let patch = CharacterPatch {
        name: changes.name,
        race: non_blank(changes.race),
        class: non_blank(changes.class),
        level: changes.level.map(check_level).transpose()?,
        ability_scores: changes
            .ability_scores
            .map(|v| encode_input(&v, "abilityScores"))
            .transpose()?,
        defenses: changes
            .defenses
            .map(|v| encode_input(&v, "defenses"))
            .transpose()?,
        health: changes
            .health
            .map(|v| encode_input(&v, "health"))
            .transpose()?,
    };

    let found = if patch.is_empty() {
        store.character(id, owner).await?.is_some()
    } else {
        store.update_character(id, owner, patch).await?
    };
    if !found {
        return Err(not_found());
    }
    Ok(())
}

/// Deletes a character of `owner` together with its powers and conditions.
pub async fn delete(store: &dyn Store, id: Id, owner: Id) -> AppResult<()> {
    if !store.delete_character(id, owner).await? {
        return Err(not_found());
    }
    tracing::info!(character_id = id, user_id = owner, "deleted character");
    Ok(())
}

/// Fails with "not found" unless `owner` owns the character.
pub(crate) async fn ensure_owned(store: &dyn Store, id: Id, owner: Id) -> AppResult<()> {
    match store.character(id, owner).await? {
        Some(_) => Ok(()),
        None => Err(not_found()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, UserInsert};

    async fn store_with_users() -> (MemoryStore, Id, Id) {
        let store = MemoryStore::new();
        let mut ids = vec![];
        for username in ["alice", "bob"] {
            let row = store
                .insert_user(UserInsert {
                    username: username.to_string(),
                    name: None,
                    password: "hash".to_string(),
                    is_admin: false,
                })
                .await
                .unwrap();
            ids.push(row.id);
        }
        (store, ids[0], ids[1])
    }

    fn named(name: &str) -> NewCharacter {
        NewCharacter {
            name: Some(name.to_string()),
            ..NewCharacter::default()
        }
    }

    #[tokio::test]
    async fn should_create_with_baseline_blocks() {
        let (store, alice, _) = store_with_users().await;
        let thorin = create(&store, alice, named("Thorin")).await.unwrap();
        assert_eq!(thorin.race, "Human");
        assert_eq!(thorin.class, "Fighter");
        assert_eq!(thorin.level, 1);
        assert_eq!(thorin.ability_scores, AbilityScores::default());
        assert_eq!(thorin.defenses, Defenses::default());
        assert_eq!(thorin.health, Health::default());

        let fetched = get(&store, thorin.id, alice).await.unwrap();
        assert_eq!(fetched, thorin);
    }

    #[tokio::test]
    async fn should_require_name_and_valid_blocks() {
        let (store, alice, _) = store_with_users().await;
        assert!(matches!(
            create(&store, alice, NewCharacter::default()).await,
            Err(AppError::BadRequest(_))
        ));
        let bad_health = NewCharacter {
            health: Some(Health {
                max_hp: 0,
                ..Health::default()
            }),
            ..named("Thorin")
        };
        assert!(matches!(
            create(&store, alice, bad_health).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(list(&store, alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_hide_characters_from_other_users() {
        let (store, alice, bob) = store_with_users().await;
        let thorin = create(&store, alice, named("Thorin")).await.unwrap();

        assert!(matches!(
            get(&store, thorin.id, bob).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            update(&store, thorin.id, bob, CharacterChanges::default()).await,
            Err(AppError::NotFound(_))
        ));
        let rename = CharacterChanges {
            name: Some("Stolen".to_string()),
            ..CharacterChanges::default()
        };
        assert!(matches!(
            update(&store, thorin.id, bob, rename).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            delete(&store, thorin.id, bob).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(get(&store, thorin.id, alice).await.unwrap().name, "Thorin");
    }

    #[tokio::test]
    async fn should_apply_partial_update() {
        let (store, alice, _) = store_with_users().await;
        let thorin = create(&store, alice, named("Thorin")).await.unwrap();
        let hurt = Health {
            hp: 3,
            surges: 2,
            ..Health::default()
        };
        update(
            &store,
            thorin.id,
            alice,
            CharacterChanges {
                level: Some(2),
                health: Some(hurt),
                ..CharacterChanges::default()
            },
        )
        .await
        .unwrap();

        let updated = get(&store, thorin.id, alice).await.unwrap();
        assert_eq!(updated.level, 2);
        assert_eq!(updated.health, hurt);
        assert_eq!(updated.name, "Thorin");
        assert_eq!(updated.defenses, Defenses::default());
    }

    #[tokio::test]
    async fn should_fail_fetch_on_corrupt_blob() {
        let (store, alice, _) = store_with_users().await;
        let thorin = create(&store, alice, named("Thorin")).await.unwrap();
        store.corrupt_character(thorin.id, "{\"str\":").await;

        assert!(matches!(
            get(&store, thorin.id, alice).await,
            Err(AppError::Internal(_))
        ));
        // The list does not read blob columns.
        assert_eq!(list(&store, alice).await.unwrap().len(), 1);
    }
}
