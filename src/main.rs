mod app;
mod config;
mod state;
mod storage;
mod users;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "hirelink=debug,axum=info,tower_http=info".to_string());
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

    let app_state = state::AppState::init()?;

    // Older files may carry records without a usable id
    match app_state.store.repair_ids().await {
        Ok(0) => {}
        Ok(n) => tracing::info!(repaired = n, "assigned ids to records missing one"),
        Err(e) => tracing::warn!(error = %e, "id repair failed; continuing"),
    }

    let server = app_state.config.server.clone();
    app::serve(app::build_app(app_state), &server).await
}
