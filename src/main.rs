use roomforum::{app, auth::password::Hasher, config::Config, db, profiles::MediaStore, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roomforum=info,tower_http=info".into()),
        )
        .init();

    let db_pool = db::connect(&config.database_url, 16).await?;
    tokio::fs::create_dir_all(&config.media_dir).await?;

    let app_state = AppState {
        db_pool,
        hasher: Hasher::with_cost(config.password_memory_kib, config.password_iterations)?,
        media: MediaStore::new(&config.media_dir),
    };

    let app = app(app_state, config.session_idle);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("roomforum listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
