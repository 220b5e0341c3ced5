//! Records exchanged with clients and the structured fields stored as text.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Row identifier used by every table.
pub type Id = i32;

/// Failure to turn a structured field into text or back.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// The text is not the expected JSON shape.
    #[error("malformed blob: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The value parsed but breaks a field constraint.
    #[error("invalid blob: {0}")]
    Invalid(String),
}

/// A composite value persisted as JSON text in a single column.
///
/// `encode` validates before writing and `decode` validates after reading, so
/// a bad value never reaches storage and a bad stored value never reaches a
/// caller.
pub trait Blob: Serialize + DeserializeOwned {
    /// Checks field constraints.
    fn validate(&self) -> Result<(), BlobError> {
        Ok(())
    }

    /// Serializes to the storage form.
    fn encode(&self) -> Result<String, BlobError> {
        self.validate()?;
        Ok(serde_json::to_string(self)?)
    }

    /// Parses the storage form.
    fn decode(text: &str) -> Result<Self, BlobError> {
        let value: Self = serde_json::from_str(text)?;
        value.validate()?;
        Ok(value)
    }
}

fn non_negative(field: &str, value: i32) -> Result<(), BlobError> {
    if value < 0 {
        Err(BlobError::Invalid(format!("{field} must not be negative")))
    } else {
        Ok(())
    }
}

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    /// Strength.
    pub str: i32,
    /// Constitution.
    pub con: i32,
    /// Dexterity.
    pub dex: i32,
    /// Intelligence.
    pub int: i32,
    /// Wisdom.
    pub wis: i32,
    /// Charisma.
    pub cha: i32,
}

impl Default for AbilityScores {
    fn default() -> Self {
        AbilityScores {
            str: 10,
            con: 10,
            dex: 10,
            int: 10,
            wis: 10,
            cha: 10,
        }
    }
}

impl Blob for AbilityScores {
    fn validate(&self) -> Result<(), BlobError> {
        non_negative("str", self.str)?;
        non_negative("con", self.con)?;
        non_negative("dex", self.dex)?;
        non_negative("int", self.int)?;
        non_negative("wis", self.wis)?;
        non_negative("cha", self.cha)
    }
}

/// Armor class and the three non-AC defenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defenses {
    /// Armor class.
    pub ac: i32,
    /// Fortitude.
    pub fort: i32,
    /// Reflex, `ref` on the wire.
    #[serde(rename = "ref")]
    pub reflex: i32,
    /// Will.
    pub will: i32,
}

impl Default for Defenses {
    fn default() -> Self {
        Defenses {
            ac: 10,
            fort: 10,
            reflex: 10,
            will: 10,
        }
    }
}

impl Blob for Defenses {
    fn validate(&self) -> Result<(), BlobError> {
        non_negative("ac", self.ac)?;
        non_negative("fort", self.fort)?;
        non_negative("ref", self.reflex)?;
        non_negative("will", self.will)
    }
}

/// Hit points and healing surges. `hp` goes below zero while dying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    /// Current hit points.
    pub hp: i32,
    /// Maximum hit points, at least 1.
    pub max_hp: i32,
    /// Healing surges left.
    pub surges: i32,
    /// Healing surges per day.
    pub max_surges: i32,
    /// Temporary hit points, omitted when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_hp: Option<i32>,
}

impl Default for Health {
    fn default() -> Self {
        Health {
            hp: 20,
            max_hp: 20,
            surges: 6,
            max_surges: 6,
            temp_hp: None,
        }
    }
}

impl Blob for Health {
    fn validate(&self) -> Result<(), BlobError> {
        if self.max_hp < 1 {
            return Err(BlobError::Invalid("maxHp must be at least 1".to_string()));
        }
        non_negative("maxSurges", self.max_surges)?;
        if self.surges < 0 || self.surges > self.max_surges {
            return Err(BlobError::Invalid(
                "surges must be between 0 and maxSurges".to_string(),
            ));
        }
        if let Some(temp_hp) = self.temp_hp {
            non_negative("tempHp", temp_hp)?;
        }
        Ok(())
    }
}

/// A named racial trait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceTrait {
    /// Trait name.
    pub name: String,
    /// Rules text. Empty when not given.
    #[serde(default)]
    pub description: String,
}

impl Blob for Vec<RaceTrait> {}

/// How often a power can be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerType {
    /// Usable any number of times.
    #[serde(rename = "At-Will")]
    AtWill,
    /// Once per encounter.
    #[serde(rename = "Encounter")]
    Encounter,
    /// Once per day.
    #[serde(rename = "Daily")]
    Daily,
}

impl PowerType {
    /// The label stored in the database and sent to clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerType::AtWill => "At-Will",
            PowerType::Encounter => "Encounter",
            PowerType::Daily => "Daily",
        }
    }
}

impl fmt::Display for PowerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PowerType {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "At-Will" => Ok(PowerType::AtWill),
            "Encounter" => Ok(PowerType::Encounter),
            "Daily" => Ok(PowerType::Daily),
            t => Err(format!("unknown power type {t}")),
        }
    }
}

/// A registered account, without its credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User id.
    pub id: Id,
    /// Login name.
    pub username: String,
    /// Display name.
    pub name: Option<String>,
    /// Whether the user may edit races.
    pub is_admin: bool,
}

/// Entry of the character list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterSummary {
    /// Character id.
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

/// A character with its stat blocks parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    /// Character id.
    pub id: Id,
    /// Owning user.
    pub user_id: Id,
    /// Character name.
    pub name: String,
    /// Race name.
    pub race: String,
    /// Class name.
    pub class: String,
    /// Character level, at least 1.
    pub level: i32,
    /// The six ability scores.
    pub ability_scores: AbilityScores,
    /// AC and the other defenses.
    pub defenses: Defenses,
    /// Hit points and surges.
    pub health: Health,
}

/// A power on a character sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Power {
    /// Power id.
    pub id: Id,
    /// Character the power belongs to.
    pub character_id: Id,
    /// Power name.
    pub name: String,
    /// Usage frequency, `type` on the wire.
    #[serde(rename = "type")]
    pub kind: PowerType,
    /// Action needed to use it, "Standard" unless given.
    pub action_type: String,
    /// Range text.
    pub range: Option<String>,
    /// Attack line.
    pub attack: Option<String>,
    /// What happens on a hit.
    pub hit: Option<String>,
    /// What happens on a miss.
    pub miss: Option<String>,
    /// Other effects.
    pub effect: Option<String>,
}

/// A temporary status on a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition id.
    pub id: Id,
    /// Character the condition applies to.
    pub character_id: Id,
    /// Condition name.
    pub name: String,
    /// How long it lasts, e.g. "save ends".
    pub duration: Option<String>,
    /// What it does.
    pub effect_description: Option<String>,
}

/// A playable race from the shared reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Race {
    /// Race id.
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
    /// Ability bonus text, e.g. "+2 Con, +2 Wis".
    pub ability_scores: Option<String>,
    /// Size category.
    pub size: Option<String>,
    /// Base speed in squares.
    pub speed: Option<i32>,
    /// Vision type.
    pub vision: Option<String>,
    /// Racial traits.
    pub traits: Vec<RaceTrait>,
}

/// Body of a character creation request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCharacter {
    /// Character name, required.
    pub name: Option<String>,
    /// Race name, "Human" when absent.
    pub race: Option<String>,
    /// Class name, "Fighter" when absent. Also read from `charClass`.
    #[serde(alias = "charClass")]
    pub class: Option<String>,
    /// Level, 1 when absent.
    pub level: Option<i32>,
    /// Ability scores, all 10 when absent.
    pub ability_scores: Option<AbilityScores>,
    /// Defenses, all 10 when absent.
    pub defenses: Option<Defenses>,
    /// Health, the baseline block when absent.
    pub health: Option<Health>,
}

/// Body of a character update. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterChanges {
    /// New name.
    pub name: Option<String>,
    /// New race.
    pub race: Option<String>,
    /// New class. Also read from `charClass`.
    #[serde(alias = "charClass")]
    pub class: Option<String>,
    /// New level.
    pub level: Option<i32>,
    /// New ability scores, replaced as a whole.
    pub ability_scores: Option<AbilityScores>,
    /// New defenses, replaced as a whole.
    pub defenses: Option<Defenses>,
    /// New health, replaced as a whole.
    pub health: Option<Health>,
}

/// Body of a power creation request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPower {
    /// Power name, required.
    pub name: Option<String>,
    /// One of "At-Will", "Encounter" or "Daily", required.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Action type, "Standard" when absent.
    pub action_type: Option<String>,
    /// Range text.
    pub range: Option<String>,
    /// Attack line.
    pub attack: Option<String>,
    /// Hit text.
    pub hit: Option<String>,
    /// Miss text.
    pub miss: Option<String>,
    /// Effect text.
    pub effect: Option<String>,
}

/// Body of a condition creation request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCondition {
    /// Condition name, required.
    pub name: Option<String>,
    /// Duration text.
    pub duration: Option<String>,
    /// Effect text.
    pub effect_description: Option<String>,
}

/// Body of a race create or update.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceInput {
    /// Race name, required.
    pub name: Option<String>,
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
    /// Ability bonus text, e.g. "+2 Con, +2 Wis".
    pub ability_scores: Option<String>,
    /// Size category.
    pub size: Option<String>,
    /// Base speed in squares.
    pub speed: Option<i32>,
    /// Vision type.
    pub vision: Option<String>,
    /// Racial traits, empty when absent.
    #[serde(default)]
    pub traits: Vec<RaceTrait>,
}
