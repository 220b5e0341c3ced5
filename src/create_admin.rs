use crate::app::{open_store, ServerError};
use crate::service::users;
use crate::settings::{Backend, Settings};

/// Prompts for credentials and stores a new administrator.
pub async fn create_admin(settings: &Settings) -> Result<(), ServerError> {
    if settings.database.backend == Backend::Memory {
        return Err(ServerError::Unsupported(
            "create-admin needs a persistent database backend",
        ));
    }
    let store = open_store(&settings.database).await?;

    let mut username = String::new();
    println!("Admin username:");
    std::io::stdin().read_line(&mut username)?;
    let password = rpassword::prompt_password("Admin password: ")?;
    let user = users::register(
        store.as_ref(),
        Some(username.trim().to_string()),
        Some(password),
        None,
        true,
    )
    .await?;
    println!("Created administrator {} with id {}", user.username, user.id);
    Ok(())
}
