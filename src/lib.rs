#![deny(missing_docs)]

//! This crate contains the server and API for keeping tabletop character sheets.

/// The API module contains the JSON handlers for characters, powers,
/// conditions and races.
mod api;
/// Module containing all the authentication, registration, cookies, etc. logic.
pub mod auth;
/// Error type shared by the handlers.
pub mod error;
/// Typed records and the structured fields stored as text.
pub mod models;
/// Ownership-scoped operations on top of the storage layer.
pub mod service;
/// This module is used to parse and read from configuration files for the
/// server.
pub mod settings;
/// Storage backends.
pub mod storage;
mod app;
mod create_admin;

pub use app::{app, run_server, ServerError};
pub use create_admin::create_admin;

use std::sync::Arc;

/// Storage shared by the handlers and the middleware.
pub type SharedStore = Arc<dyn storage::Store>;
