//! Recomputes influencer revenue, commission and campaign ROI from orders.
use anyhow::Context;
use collabsync::{config::Config, db::db::DBClient, logging, service::revenue_service};
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

    let db_client = DBClient::new(pool);

    match revenue_service::run_aggregation(&db_client).await {
        Ok(summary) => {
            tracing::info!(
                "Revenue aggregation complete: reset {} collaborations and {} metric rows, updated {} collaborations, wrote {} campaign metrics",
                summary.influencer_rows_reset,
                summary.metric_rows_reset,
                summary.influencer_rows_updated,
                summary.metric_rows_written
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Revenue aggregation failed: {}", e);
            Err(e.into())
        }
    }
}
