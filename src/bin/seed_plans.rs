//! Inserts the default Free, Basic and Premium plans for brands and influencers.
use anyhow::Context;
use collabsync::{config::Config, db::db::DBClient, logging, service::plan_maintenance};
use dotenv::dotenv;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let (production, log_dir) = Config::logging_only();
    let _log_guard = logging::init(production, &log_dir).map_err(|e| anyhow::anyhow!(e))?;

    let database_url = Config::database_url_only().context("DATABASE_URL must be set")?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .context("Failed to connect to the database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let db_client = match std::env::var("REDIS_URL").ok().filter(|url| !url.is_empty()) {
        Some(redis_url) => DBClient::with_redis(pool, &redis_url).await,
        None => DBClient::new(pool),
    };

    let summary = plan_maintenance::seed_default_plans(&db_client).await?;
    tracing::info!(
        "Plan seeding complete: {} inserted, {} already present",
        summary.inserted,
        summary.skipped
    );
    Ok(())
}
