//! JSON handlers for characters, their powers and conditions, and races.
//!
//! Handlers behind the session gate read the caller from the `CurrentUser`
//! extension and pass it down to the services.

mod characters;
mod conditions;
mod powers;
mod races;

pub use characters::{
    create_character, delete_character, get_character, list_characters, update_character,
};
pub use conditions::{create_condition, delete_condition, list_conditions};
pub use powers::{create_power, delete_power, list_powers};
pub use races::{create_race, delete_race, get_race, list_races, update_race};
