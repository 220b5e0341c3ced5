use super::{
    CharacterInsert, CharacterPatch, CharacterRow, CharacterSummaryRow, ConditionInsert,
    ConditionRow, PowerInsert, PowerRow, RaceRow, RaceWrite, Store, StorageError, StorageResult,
    UserInsert, UserRow,
};
use crate::models::Id;
use crate::settings::Database;
use axum::async_trait;
use sqlx::migrate::MigrateError;
use sqlx::postgres::{PgPool, PgPoolOptions};

// SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

const USER_COLUMNS: &str = "id, username, name, password, is_admin";
const CHARACTER_COLUMNS: &str =
    "id, user_id, name, race, class, level, ability_scores, defenses, health";
const POWER_COLUMNS: &str = "id, character_id, name, type, action_type, range, attack, hit, miss, effect";
const CONDITION_COLUMNS: &str = "id, character_id, name, duration, effect_description";
const RACE_COLUMNS: &str = "id, name, description_short, description_long, average_height_min, \
    average_height_max, average_weight_min, average_weight_max, ability_scores, size, speed, \
    vision, traits";

fn classify(err: sqlx::Error) -> StorageError {
    let unique = matches!(
        &err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION)
    );
    if unique {
        StorageError::Conflict
    } else {
        StorageError::Database(err)
    }
}

/// [`Store`] backed by a Postgres pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing pool.
    pub fn new(pool: PgPool) -> PgStore {
        PgStore { pool }
    }

    /// Opens a pool with the configured size.
    pub async fn connect(database: &Database) -> Result<PgStore, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(database.max_connections)
            .connect(&database.url)
            .await?;
        Ok(PgStore::new(pool))
    }

    /// Applies the embedded migrations.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("database/migrations").run(&self.pool).await
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: UserInsert) -> StorageResult<UserRow> {
        sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (username, name, password, is_admin) VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user.username)
        .bind(user.name)
        .bind(user.password)
        .bind(user.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn user_by_username(&self, username: &str) -> StorageResult<Option<UserRow>> {
        Ok(sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn user_by_id(&self, id: Id) -> StorageResult<Option<UserRow>> {
        Ok(sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_characters(&self, owner: Id) -> StorageResult<Vec<CharacterSummaryRow>> {
        Ok(sqlx::query_as::<_, CharacterSummaryRow>(
            "SELECT id, name, race, class, level FROM characters WHERE user_id = $1 ORDER BY id",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_character(
        &self,
        owner: Id,
        character: CharacterInsert,
    ) -> StorageResult<CharacterRow> {
        sqlx::query_as::<_, CharacterRow>(&format!(
            "INSERT INTO characters \
             (user_id, name, race, class, level, ability_scores, defenses, health) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {CHARACTER_COLUMNS}"
        ))
        .bind(owner)
        .bind(character.name)
        .bind(character.race)
        .bind(character.class)
        .bind(character.level)
        .bind(character.ability_scores)
        .bind(character.defenses)
        .bind(character.health)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn character(&self, id: Id, owner: Id) -> StorageResult<Option<CharacterRow>> {
        Ok(sqlx::query_as::<_, CharacterRow>(&format!(
            "SELECT {CHARACTER_COLUMNS} FROM characters WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update_character(
        &self,
        id: Id,
        owner: Id,
        patch: CharacterPatch,
    ) -> StorageResult<bool> {
        let result = sqlx::query(
            "UPDATE characters SET \
             name = COALESCE($3, name), \
             race = COALESCE($4, race), \
             class = COALESCE($5, class), \
             level = COALESCE($6, level), \
             ability_scores = COALESCE($7, ability_scores), \
             defenses = COALESCE($8, defenses), \
             health = COALESCE($9, health) \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(owner)
        .bind(patch.name)
        .bind(patch.race)
        .bind(patch.class)
        .bind(patch.level)
        .bind(patch.ability_scores)
        .bind(patch.defenses)
        .bind(patch.health)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_character(&self, id: Id, owner: Id) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM characters WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_powers(&self, character_id: Id, owner: Id) -> StorageResult<Vec<PowerRow>> {
        Ok(sqlx::query_as::<_, PowerRow>(
            "SELECT p.id, p.character_id, p.name, p.type, p.action_type, p.range, p.attack, \
             p.hit, p.miss, p.effect \
             FROM powers p JOIN characters c ON c.id = p.character_id \
             WHERE p.character_id = $1 AND c.user_id = $2 ORDER BY p.id",
        )
        .bind(character_id)
        .bind(owner)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_power(
        &self,
        character_id: Id,
        owner: Id,
        power: PowerInsert,
    ) -> StorageResult<Option<PowerRow>> {
        Ok(sqlx::query_as::<_, PowerRow>(&format!(
            "INSERT INTO powers \
             (character_id, name, type, action_type, range, attack, hit, miss, effect) \
             SELECT c.id, $3, $4, $5, $6, $7, $8, $9, $10 FROM characters c \
             WHERE c.id = $1 AND c.user_id = $2 \
             RETURNING {POWER_COLUMNS}"
        ))
        .bind(character_id)
        .bind(owner)
        .bind(power.name)
        .bind(power.kind)
        .bind(power.action_type)
        .bind(power.range)
        .bind(power.attack)
        .bind(power.hit)
        .bind(power.miss)
        .bind(power.effect)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_power(&self, id: Id, character_id: Id, owner: Id) -> StorageResult<bool> {
        let result = sqlx::query(
            "DELETE FROM powers p USING characters c \
             WHERE p.id = $1 AND p.character_id = $2 \
             AND c.id = p.character_id AND c.user_id = $3",
        )
        .bind(id)
        .bind(character_id)
        .bind(owner)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_conditions(
        &self,
        character_id: Id,
        owner: Id,
    ) -> StorageResult<Vec<ConditionRow>> {
        Ok(sqlx::query_as::<_, ConditionRow>(
            "SELECT k.id, k.character_id, k.name, k.duration, k.effect_description \
             FROM conditions k JOIN characters c ON c.id = k.character_id \
             WHERE k.character_id = $1 AND c.user_id = $2 ORDER BY k.id",
        )
        .bind(character_id)
        .bind(owner)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_condition(
        &self,
        character_id: Id,
        owner: Id,
        condition: ConditionInsert,
    ) -> StorageResult<Option<ConditionRow>> {
        Ok(sqlx::query_as::<_, ConditionRow>(&format!(
            "INSERT INTO conditions (character_id, name, duration, effect_description) \
             SELECT c.id, $3, $4, $5 FROM characters c \
             WHERE c.id = $1 AND c.user_id = $2 \
             RETURNING {CONDITION_COLUMNS}"
        ))
        .bind(character_id)
        .bind(owner)
        .bind(condition.name)
        .bind(condition.duration)
        .bind(condition.effect_description)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_condition(
        &self,
        id: Id,
        character_id: Id,
        owner: Id,
    ) -> StorageResult<bool> {
        let result = sqlx::query(
            "DELETE FROM conditions k USING characters c \
             WHERE k.id = $1 AND k.character_id = $2 \
             AND c.id = k.character_id AND c.user_id = $3",
        )
        .bind(id)
        .bind(character_id)
        .bind(owner)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_races(&self) -> StorageResult<Vec<RaceRow>> {
        Ok(sqlx::query_as::<_, RaceRow>(&format!(
            "SELECT {RACE_COLUMNS} FROM races ORDER BY name, id"
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn race(&self, id: Id) -> StorageResult<Option<RaceRow>> {
        Ok(sqlx::query_as::<_, RaceRow>(&format!(
            "SELECT {RACE_COLUMNS} FROM races WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn insert_race(&self, race: RaceWrite) -> StorageResult<RaceRow> {
        sqlx::query_as::<_, RaceRow>(&format!(
            "INSERT INTO races (name, description_short, description_long, average_height_min, \
             average_height_max, average_weight_min, average_weight_max, ability_scores, size, \
             speed, vision, traits) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {RACE_COLUMNS}"
        ))
        .bind(race.name)
        .bind(race.description_short)
        .bind(race.description_long)
        .bind(race.average_height_min)
        .bind(race.average_height_max)
        .bind(race.average_weight_min)
        .bind(race.average_weight_max)
        .bind(race.ability_scores)
        .bind(race.size)
        .bind(race.speed)
        .bind(race.vision)
        .bind(race.traits)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn update_race(&self, id: Id, race: RaceWrite) -> StorageResult<Option<RaceRow>> {
        sqlx::query_as::<_, RaceRow>(&format!(
            "UPDATE races SET name = $2, description_short = $3, description_long = $4, \
             average_height_min = $5, average_height_max = $6, average_weight_min = $7, \
             average_weight_max = $8, ability_scores = $9, size = $10, speed = $11, \
             vision = $12, traits = $13 \
             WHERE id = $1 RETURNING {RACE_COLUMNS}"
        ))
        .bind(id)
        .bind(race.name)
        .bind(race.description_short)
        .bind(race.description_long)
        .bind(race.average_height_min)
        .bind(race.average_height_max)
        .bind(race.average_weight_min)
        .bind(race.average_weight_max)
        .bind(race.ability_scores)
        .bind(race.size)
        .bind(race.speed)
        .bind(race.vision)
        .bind(race.traits)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)
    }

    async fn delete_race(&self, id: Id) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM races WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
