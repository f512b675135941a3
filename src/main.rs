use medical_center_api::{app, config::Config, db, models::AppState};

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cfg = Config::from_env()?;
    let pool = db::connect_sqlite(&cfg.database_url, cfg.db_max_connections).await?;
    db::create_schema(&pool).await?;

    let state = AppState { db: pool };

    let app = app(state, &cfg.cors_origins)?;

    tracing::info!(origins = ?cfg.cors_origins, "CORS allow-list");
    tracing::info!("Listening on http://{}", cfg.bind_addr);
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
