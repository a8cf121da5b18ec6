//! Library server: loads settings from the environment (and `.env`), migrates
//! the database, and serves the book and author resources.

use my_library::{create_app, Settings};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    // Configuration errors are fatal before anything is served.
    let settings = Settings::load()?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(settings.log_filter()?)?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if settings.testing()? {
        tracing::warn!("FLASK_TESTING is set");
    }
    let app = create_app(&settings).await?;

    let listener = TcpListener::bind(settings.bind_addr()?).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
