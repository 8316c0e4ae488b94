//! Retires the pro and enterprise tiers and checks the remaining catalog.
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

    let db_client = match std::env::var("REDIS_URL").ok().filter(|url| !url.is_empty()) {
        Some(redis_url) => DBClient::with_redis(pool, &redis_url).await,
        None => DBClient::new(pool),
    };

    let summary = plan_maintenance::cleanup_deprecated_plans(&db_client)
        .await
        .map_err(|e| {
            tracing::error!("Plan cleanup failed: {}", e);
            e
        })?;

    tracing::info!(
        "Plan cleanup complete: {} subscriptions moved, {} plans deleted, {} warnings",
        summary.subscriptions_moved,
        summary.plans_deleted,
        summary.warnings.len()
    );
    Ok(())
}
