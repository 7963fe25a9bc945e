use std::net::SocketAddr;

use jobintel::config::Config;
use jobintel::jobs::SeaOrmJobStore;
use jobintel::{create_app, db, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();

    let conn = db::connect(&config.database_url).await?;
    if !config.database_url.starts_with("postgres") {
        db::ensure_schema(&conn).await?;
    }

    let state = AppState::from_config(&config, SeaOrmJobStore::new(conn))?;
    let app = create_app(state, &config);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server running on http://{}", config.bind_addr);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
