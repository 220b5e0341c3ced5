//! Resource services. Each call takes the caller's user id where ownership
//! applies, and converts between typed values and storage rows.

pub mod characters;
pub mod conditions;
pub mod powers;
pub mod races;
pub mod users;
