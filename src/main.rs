mod app;
mod auth;
mod certificates;
mod config;
mod contact;
mod courses;
mod dashboard;
mod enrollments;
mod error;
mod extract;
mod state;
mod store;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "nexlearn=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = AppState::init().await?;

    if let Err(e) = courses::seed::seed_if_empty(state.courses.as_ref()).await {
        tracing::warn!(error = %e, "course seeding failed; continuing");
    }

    let app = app::build_app(state);
    app::serve(app).await
}
