// service/background_jobs.rs
use std::sync::Arc;

use chrono::Utc;
use tokio::time::{interval, Duration};

use crate::{service::subscription_service::SubscriptionService, AppState};

/// Hourly sweep over subscriptions that have reached their end date.
pub async fn start_subscription_expiry_job(app_state: Arc<AppState>) {
    let mut interval = interval(Duration::from_secs(3600));
    let service = SubscriptionService::new(app_state.db_client.clone());

    loop {
        interval.tick().await;

        tracing::info!("Running subscription expiry job at {}", Utc::now());

        match service.process_due_subscriptions(Utc::now()).await {
            Ok(summary) => tracing::info!(
                "Subscription expiry job completed: {} expired, {} renewals awaiting payment",
                summary.expired,
                summary.renewals_requested
            ),
            Err(e) => tracing::error!("Subscription expiry job failed: {}", e),
        }
    }
}
