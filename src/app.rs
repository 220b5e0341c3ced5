use crate::api::{
    create_character, create_condition, create_power, create_race, delete_character,
    delete_condition, delete_power, delete_race, get_character, get_race, list_characters,
    list_conditions, list_powers, list_races, update_character, update_race,
};
use crate::auth::{
    auth_middleware, current_session, login, logout, register, require_admin, SessionError,
    SessionManager, SharedSessions,
};
use crate::error::AppError;
use crate::settings::{Backend, Database, Settings};
use crate::storage::{MemoryStore, PgStore};
use crate::SharedStore;
use axum::{
    handler::Handler,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Everything that can stop the server from starting or running.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The session settings are unusable.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// Could not reach the database.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// Could not bring the schema up to date.
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    /// `base.listen` is not a socket address.
    #[error("invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),
    /// Reading from the terminal failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A service call failed.
    #[error(transparent)]
    App(#[from] AppError),
    /// The HTTP server stopped with an error.
    #[error("server error: {0}")]
    Serve(Box<dyn std::error::Error + Send + Sync>),
    /// The command cannot run with this configuration.
    #[error("{0}")]
    Unsupported(&'static str),
}

fn init_tracing(settings: &Settings) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .ok()
                .or_else(|| settings.base.rust_log.clone())
                .unwrap_or_else(|| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Opens the configured store, migrating Postgres first.
pub(crate) async fn open_store(database: &Database) -> Result<SharedStore, ServerError> {
    match database.backend {
        Backend::Postgres => {
            let store = PgStore::connect(database).await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        Backend::Memory => {
            tracing::warn!("Using the in-memory store, all data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Runs the server. Main entrypoint for the server app.
pub async fn run_server(settings: Settings) -> Result<(), ServerError> {
    init_tracing(&settings);

    let sessions = Arc::new(SessionManager::from_settings(&settings.auth)?);
    if settings.auth.uses_development_secret() {
        tracing::warn!(
            "Sessions are signed with the development secret, set auth.secret before deploying!"
        );
    }
    if !settings.auth.secure_cookie {
        tracing::warn!("Session cookies without the Secure flag should not be used in production!");
    }
    let store = open_store(&settings.database).await?;

    let addr: SocketAddr = settings.base.listen.parse()?;
    tracing::info!("listening on {} ({})", addr, settings.base.url);

    axum::Server::bind(&addr)
        .serve(app(store, sessions).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Serve(Box::new(e)))?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("could not listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

/// Builds the router with the session gate on every private route.
pub fn app(store: SharedStore, sessions: SharedSessions) -> Router {
    let admin_store = store.clone();
    let admin_routes = Router::new()
        .route("/races", post(create_race))
        .route("/races/:id", put(update_race).delete(delete_race))
        .route_layer(middleware::from_fn(move |req, next| {
            require_admin(req, next, admin_store.clone())
        }));

    let gate_sessions = sessions.clone();
    let private_routes = Router::new()
        .route("/characters", get(list_characters).post(create_character))
        .route(
            "/characters/:id",
            get(get_character)
                .put(update_character)
                .delete(delete_character),
        )
        .route(
            "/characters/:id/powers",
            get(list_powers).post(create_power).delete(delete_power),
        )
        .route(
            "/characters/:id/conditions",
            get(list_conditions)
                .post(create_condition)
                .delete(delete_condition),
        )
        .nest("/admin", admin_routes)
        .route_layer(middleware::from_fn(move |req, next| {
            auth_middleware(req, next, gate_sessions.clone())
        }));

    let api_routes = Router::new()
        .merge(private_routes)
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(current_session))
        .route("/races", get(list_races))
        .route("/races/:id", get(get_race));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(|| async { "ok" }))
        .fallback(fallback.into_service())
        .layer(Extension(store))
        .layer(Extension(sessions))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

async fn fallback() -> impl IntoResponse {
    StatusCode::NOT_FOUND
}
