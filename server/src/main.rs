mod config;
mod db;
mod routes;
mod services;
mod state;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("no .env loaded: {e}");
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = config::ServerConfig::from_env().expect("invalid server configuration");

    let pool = db::init_pool(&cfg.database_url, cfg.db_max_connections)
        .await
        .expect("database init failed");

    let state = state::AppState::new(pool, &cfg);

    let app = routes::app(state);
    let port = cfg.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "design studio listening");
    axum::serve(listener, app).await.expect("server failed");
}
