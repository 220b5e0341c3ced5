//! Persistence for users, characters, powers, conditions and races.
//!
//! Rows keep their structured columns as raw text; turning that text into
//! typed values is the job of [`crate::service`]. Every character-scoped
//! method takes the owning user id and filters on it in the same statement.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::models::Id;
use axum::async_trait;

/// Typed failure of a storage call.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A uniqueness constraint rejected the write.
    #[error("unique constraint violated")]
    Conflict,
    /// Stored data could not be turned back into a value.
    #[error("corrupt record: {0}")]
    Corrupt(String),
    /// Anything else the database reported.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result alias for storage calls.
pub type StorageResult<T> = Result<T, StorageError>;

/// A user row, including the password hash.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    /// Primary key.
    pub id: Id,
    /// Unique login name.
    pub username: String,
    /// Optional display name.
    pub name: Option<String>,
    /// Argon2 PHC string.
    pub password: String,
    /// Whether the user may edit the race table.
    pub is_admin: bool,
}

/// Values for a new user row.
#[derive(Debug, Clone)]
pub struct UserInsert {
    /// Unique login name.
    pub username: String,
    /// Optional display name.
    pub name: Option<String>,
    /// Argon2 PHC string.
    pub password: String,
    /// Whether the user may edit the race table.
    pub is_admin: bool,
}

/// Columns of the character list.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CharacterSummaryRow {
    /// Primary key.
    pub id: Id,
    /// Character name.
    pub name: String,
    /// Race name.
    pub race: String,
    /// Class name.
    pub class: String,
    /// Character level.
    pub level: i32,
}

/// A full character row with blob columns as text.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CharacterRow {
    /// Primary key.
    pub id: Id,
    /// Owning user.
    pub user_id: Id,
    /// Character name.
    pub name: String,
    /// Race name.
    pub race: String,
    /// Class name.
    pub class: String,
    /// Character level.
    pub level: i32,
    /// Encoded ability scores.
    pub ability_scores: String,
    /// Encoded defenses.
    pub defenses: String,
    /// Encoded health.
    pub health: String,
}

/// Values for a new character row.
#[derive(Debug, Clone)]
pub struct CharacterInsert {
    /// Character name.
    pub name: String,
    /// Race name.
    pub race: String,
    /// Class name.
    pub class: String,
    /// Character level.
    pub level: i32,
    /// Encoded ability scores.
    pub ability_scores: String,
    /// Encoded defenses.
    pub defenses: String,
    /// Encoded health.
    pub health: String,
}

/// Column changes for a character. `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct CharacterPatch {
    /// New name.
    pub name: Option<String>,
    /// New race.
    pub race: Option<String>,
    /// New class.
    pub class: Option<String>,
    /// New level.
    pub level: Option<i32>,
    /// New encoded ability scores.
    pub ability_scores: Option<String>,
    /// New encoded defenses.
    pub defenses: Option<String>,
    /// New encoded health.
    pub health: Option<String>,
}

impl CharacterPatch {
    /// True when no column would change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.race.is_none()
            && self.class.is_none()
            && self.level.is_none()
            && self.ability_scores.is_none()
            && self.defenses.is_none()
            && self.health.is_none()
    }
}

/// A power row. `kind` is the raw `type` column.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PowerRow {
    /// Primary key.
    pub id: Id,
    /// Parent character.
    pub character_id: Id,
    /// Power name.
    pub name: String,
    /// Usage frequency label.
    #[sqlx(rename = "type")]
    pub kind: String,
    /// Action type tag.
    pub action_type: String,
    /// Range text.
    pub range: Option<String>,
    /// Attack text.
    pub attack: Option<String>,
    /// Hit text.
    pub hit: Option<String>,
    /// Miss text.
    pub miss: Option<String>,
    /// Effect text.
    pub effect: Option<String>,
}

/// Values for a new power row.
#[derive(Debug, Clone)]
pub struct PowerInsert {
    /// Power name.
    pub name: String,
    /// Usage frequency label.
    pub kind: String,
    /// Action type tag.
    pub action_type: String,
    /// Range text.
    pub range: Option<String>,
    /// Attack text.
    pub attack: Option<String>,
    /// Hit text.
    pub hit: Option<String>,
    /// Miss text.
    pub miss: Option<String>,
    /// Effect text.
    pub effect: Option<String>,
}

/// A condition row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConditionRow {
    /// Primary key.
    pub id: Id,
    /// Parent character.
    pub character_id: Id,
    /// Condition name.
    pub name: String,
    /// Duration text.
    pub duration: Option<String>,
    /// Effect text.
    pub effect_description: Option<String>,
}

/// Values for a new condition row.
#[derive(Debug, Clone)]
pub struct ConditionInsert {
    /// Condition name.
    pub name: String,
    /// Duration text.
    pub duration: Option<String>,
    /// Effect text.
    pub effect_description: Option<String>,
}

/// A race row with the trait list as text.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RaceRow {
    /// Primary key.
    pub id: Id,
    /// Race name.
    pub name: String,
    /// One line description.
    pub description_short: Option<String>,
    /// Full description.
    pub description_long: Option<String>,
    /// Lower bound of the average height.
    pub average_height_min: Option<i32>,
    /// Upper bound of the average height.
    pub average_height_max: Option<i32>,
    /// Lower bound of the average weight.
    pub average_weight_min: Option<i32>,
    /// Upper bound of the average weight.
    pub average_weight_max: Option<i32>,
    /// Ability bonus text.
    pub ability_scores: Option<String>,
    /// Size category.
    pub size: Option<String>,
    /// Base speed.
    pub speed: Option<i32>,
    /// Vision type.
    pub vision: Option<String>,
    /// Encoded trait list.
    pub traits: String,
}

/// Values written on race create and update.
#[derive(Debug, Clone)]
pub struct RaceWrite {
    /// Race name.
    pub name: String,
    /// One line description.
    pub description_short: Option<String>,
    /// Full description.
    pub description_long: Option<String>,
    /// Lower bound of the average height.
    pub average_height_min: Option<i32>,
    /// Upper bound of the average height.
    pub average_height_max: Option<i32>,
    /// Lower bound of the average weight.
    pub average_weight_min: Option<i32>,
    /// Upper bound of the average weight.
    pub average_weight_max: Option<i32>,
    /// Ability bonus text.
    pub ability_scores: Option<String>,
    /// Size category.
    pub size: Option<String>,
    /// Base speed.
    pub speed: Option<i32>,
    /// Vision type.
    pub vision: Option<String>,
    /// Encoded trait list.
    pub traits: String,
}

impl RaceWrite {
    fn into_row(self, id: Id) -> RaceRow {
        RaceRow {
            id,
            name: self.name,
            description_short: self.description_short,
            description_long: self.description_long,
            average_height_min: self.average_height_min,
            average_height_max: self.average_height_max,
            average_weight_min: self.average_weight_min,
            average_weight_max: self.average_weight_max,
            ability_scores: self.ability_scores,
            size: self.size,
            speed: self.speed,
            vision: self.vision,
            traits: self.traits,
        }
    }
}

/// Storage backend used by the services.
///
/// Methods returning `bool` report whether a row matched. Methods returning
/// `Option` yield `None` when the row does not exist or is not owned by
/// `owner`; the two cases are indistinguishable to the caller.
#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts a user. Fails with [`StorageError::Conflict`] on a taken username.
    async fn insert_user(&self, user: UserInsert) -> StorageResult<UserRow>;
    /// Finds a user by login name.
    async fn user_by_username(&self, username: &str) -> StorageResult<Option<UserRow>>;
    /// Finds a user by id.
    async fn user_by_id(&self, id: Id) -> StorageResult<Option<UserRow>>;

    /// Lists the characters of `owner`.
    async fn list_characters(&self, owner: Id) -> StorageResult<Vec<CharacterSummaryRow>>;
    /// Inserts a character for `owner`.
    async fn insert_character(&self, owner: Id, character: CharacterInsert)
        -> StorageResult<CharacterRow>;
    /// Fetches a character owned by `owner`.
    async fn character(&self, id: Id, owner: Id) -> StorageResult<Option<CharacterRow>>;
    /// Applies `patch` to a character owned by `owner`.
    async fn update_character(&self, id: Id, owner: Id, patch: CharacterPatch)
        -> StorageResult<bool>;
    /// Deletes a character owned by `owner`, along with its powers and conditions.
    async fn delete_character(&self, id: Id, owner: Id) -> StorageResult<bool>;

    /// Lists the powers of a character owned by `owner`.
    async fn list_powers(&self, character_id: Id, owner: Id) -> StorageResult<Vec<PowerRow>>;
    /// Adds a power to a character owned by `owner`.
    async fn insert_power(
        &self,
        character_id: Id,
        owner: Id,
        power: PowerInsert,
    ) -> StorageResult<Option<PowerRow>>;
    /// Deletes a power matching both ids on a character owned by `owner`.
    async fn delete_power(&self, id: Id, character_id: Id, owner: Id) -> StorageResult<bool>;

    /// Lists the conditions of a character owned by `owner`.
    async fn list_conditions(&self, character_id: Id, owner: Id)
        -> StorageResult<Vec<ConditionRow>>;
    /// Adds a condition to a character owned by `owner`.
    async fn insert_condition(
        &self,
        character_id: Id,
        owner: Id,
        condition: ConditionInsert,
    ) -> StorageResult<Option<ConditionRow>>;
    /// Deletes a condition matching both ids on a character owned by `owner`.
    async fn delete_condition(&self, id: Id, character_id: Id, owner: Id)
        -> StorageResult<bool>;

    /// Lists every race.
    async fn list_races(&self) -> StorageResult<Vec<RaceRow>>;
    /// Fetches a race.
    async fn race(&self, id: Id) -> StorageResult<Option<RaceRow>>;
    /// Inserts a race.
    async fn insert_race(&self, race: RaceWrite) -> StorageResult<RaceRow>;
    /// Replaces a race.
    async fn update_race(&self, id: Id, race: RaceWrite) -> StorageResult<Option<RaceRow>>;
    /// Deletes a race.
    async fn delete_race(&self, id: Id) -> StorageResult<bool>;
}
