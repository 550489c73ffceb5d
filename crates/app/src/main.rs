use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "comptoir={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let timezone: chrono_tz::Tz = settings
        .app
        .timezone
        .parse()
        .map_err(|err| format!("invalid timezone {}: {err}", settings.app.timezone))?;

    let server = settings.server;
    let db = parse_database(&server.database).await.inspect_err(|err| {
        tracing::error!("failed to initialize database: {err}");
    })?;
    let engine = engine::Engine::builder()
        .database(db)
        .build()
        .await
        .inspect_err(|err| tracing::error!("failed to build engine from database: {err}"))?;

    let config = server::ServerConfig {
        bind: server.bind.unwrap_or_else(|| "127.0.0.1".to_string()),
        port: server.port,
        enforce_subscription: server.enforce_subscription,
        webhook_secret: server.webhook_secret,
        timezone,
    };
    if !config.enforce_subscription {
        tracing::warn!("subscription enforcement is disabled");
    }
    if config.webhook_secret.is_none() {
        tracing::warn!("payment webhook accepts unauthenticated notifications");
    }

    server::run(engine, config).await;
    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
