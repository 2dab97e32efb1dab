mod auth;
mod db;
mod error;
mod extract;
mod middleware;
mod routes;
mod state;
mod task;
mod user;

#[cfg(test)]
mod test_support;

use anyhow::Context;
use auth::{AuthService, PgTokenBlacklist};
use db::{create_pool, run_migrations};
use routes::create_router;
use state::{AppState, Config};
use std::sync::Arc;
use task::{PgTaskRepository, TaskService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use user::PgUserRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,task_tracker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    tracing::info!("Connecting to database...");
    let db = create_pool(&config.database_url, config.database_max_connections)
        .await
        .context("failed to connect to database")?;

    tracing::info!("Running migrations...");
    run_migrations(&db).await.context("failed to run migrations")?;

    // Create repositories
    let user_repository = Arc::new(PgUserRepository::new(db.clone()));
    let task_repository = Arc::new(PgTaskRepository::new(db.clone()));
    let token_blacklist = Arc::new(PgTokenBlacklist::new(db.clone()));

    // Create services
    let auth_service = AuthService::new(user_repository, token_blacklist, &config)
        .context("invalid BCRYPT_COST")?;
    let task_service = TaskService::new(task_repository);

    let state = AppState {
        config: config.clone(),
        auth_service,
        task_service,
    };

    let app = create_router(state);

    let addr = config.addr();
    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
