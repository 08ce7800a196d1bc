use std::sync::Arc;

use notewall::config::{init_db, run_migrations, Config};
use notewall::services::{mailer::FileMailer, session::SessionService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notewall=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load environment configuration");

    let db = init_db(&config.database_url)
        .await
        .expect("Failed to connect to database");
    run_migrations(&db).await.expect("Failed to run migrations");
    tracing::info!("Connected to {}", config.database_url);

    let sessions = SessionService::new(config.session_secret.clone());
    let mailer = Arc::new(FileMailer::new(
        config.mail_outbox_dir.clone().into(),
        format!("http://{}", config.bind_addr),
    ));

    let bind_addr = config.bind_addr.clone();
    let app = notewall::create_app(db, sessions, mailer, config).await;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind listener");
    tracing::info!("Server running on http://{}", bind_addr);
    axum::serve(listener, app).await.expect("Server error");
}
