//! Accounts and credential checks.

use crate::auth::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::models::{Id, User};
use crate::storage::{Store, StorageError, UserInsert, UserRow};
use std::sync::OnceLock;

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            name: row.name,
            is_admin: row.is_admin,
        }
    }
}

fn required(value: Option<String>, message: &str) -> AppResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::BadRequest(message.to_string())),
    }
}

async fn hash_blocking(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("could not hash password: {e}")))
}

/// Creates an account. A taken username is a conflict.
pub async fn register(
    store: &dyn Store,
    username: Option<String>,
    password: Option<String>,
    name: Option<String>,
    is_admin: bool,
) -> AppResult<User> {
    let username = required(username, "Username and password are required")?;
    let password = required(password, "Username and password are required")?;
    let password = hash_blocking(password).await?;

    let row = store
        .insert_user(UserInsert {
            username: username.trim().to_string(),
            name: name.filter(|n| !n.trim().is_empty()),
            password,
            is_admin,
        })
        .await
        .map_err(|e| match e {
            StorageError::Conflict => AppError::Conflict("Username already exists".to_string()),
            e => e.into(),
        })?;
    tracing::info!(user_id = row.id, is_admin, "registered user");
    Ok(row.into())
}

// Unknown usernames are checked against this so both failures cost one argon2 run.
fn dummy_hash() -> &'static str {
    static DUMMY_HASH: OnceLock<String> = OnceLock::new();
    DUMMY_HASH.get_or_init(|| hash_password("no-such-user").unwrap_or_default())
}

/// Checks a username and password pair.
///
/// Unknown user and wrong password are the same error and take the same time.
pub async fn authenticate(
    store: &dyn Store,
    username: Option<String>,
    password: Option<String>,
) -> AppResult<User> {
    let username = required(username, "Username and password are required")?;
    let password = required(password, "Username and password are required")?;

    let row = store.user_by_username(username.trim()).await?;
    let stored = row.as_ref().map(|row| row.password.clone());
    let matches = tokio::task::spawn_blocking(move || {
        let hash = stored.as_deref().unwrap_or_else(|| dummy_hash());
        verify_password(&password, hash)
    })
    .await
    .map_err(|e| AppError::Internal(format!("verification task failed: {e}")))?;

    match row {
        Some(row) if matches => Ok(row.into()),
        Some(row) => {
            tracing::debug!(user_id = row.id, "wrong password");
            Err(AppError::Unauthorized)
        }
        None => {
            tracing::debug!("login for unknown user");
            Err(AppError::Unauthorized)
        }
    }
}

/// The user behind a session, if it still exists.
pub async fn find(store: &dyn Store, id: Id) -> AppResult<Option<User>> {
    Ok(store.user_by_id(id).await?.map(User::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[tokio::test]
    async fn should_register_then_authenticate() {
        let store = MemoryStore::new();
        let alice = register(&store, some("alice"), some("pw1"), some("Alice"), false)
            .await
            .unwrap();
        assert_eq!(alice.username, "alice");
        assert!(!alice.is_admin);

        let row = store.user_by_username("alice").await.unwrap().unwrap();
        assert_ne!(row.password, "pw1");

        let logged_in = authenticate(&store, some("alice"), some("pw1")).await.unwrap();
        assert_eq!(logged_in.id, alice.id);
    }

    #[tokio::test]
    async fn should_reject_duplicates_and_bad_credentials() {
        let store = MemoryStore::new();
        register(&store, some("alice"), some("pw1"), None, false)
            .await
            .unwrap();
        assert!(matches!(
            register(&store, some("alice"), some("other"), None, false).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            authenticate(&store, some("alice"), some("wrong")).await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            authenticate(&store, some("nobody"), some("pw1")).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn should_check_unknown_users_against_a_real_hash() {
        let hash = dummy_hash();
        assert!(argon2::PasswordHash::new(hash).is_ok());
        assert!(!verify_password("no-such-user-guess", hash));
        assert!(std::ptr::eq(hash, dummy_hash()));
    }

    #[tokio::test]
    async fn should_require_both_fields() {
        let store = MemoryStore::new();
        assert!(matches!(
            register(&store, None, some("pw"), None, false).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            register(&store, some("bob"), some("  "), None, false).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            authenticate(&store, some("bob"), None).await,
            Err(AppError::BadRequest(_))
        ));
    }
}
