mod login;
mod middleware;
mod password;
mod register;
mod session;

pub use login::{current_session, login, logout};
pub use middleware::{auth as auth_middleware, require_admin};
pub use password::{hash_password, verify_password};
pub use register::register;
pub use session::{SessionError, SessionManager, MIN_SECRET_LEN};

use crate::models::Id;
use std::sync::Arc;

/// Session manager shared by the handlers and the middleware.
pub type SharedSessions = Arc<SessionManager>;

/// A structure representing the user currently logged in.
#[derive(Clone, Copy, Debug)]
pub struct CurrentUser {
    /// The user identification number.
    pub user_id: Id,
}

const COOKIE_NAME: &str = "session";
