pub mod background_jobs;
pub mod campaign_service;
pub mod deliverable_service;
pub mod error;
pub mod media_store;
pub mod moderation_service;
pub mod plan_maintenance;
pub mod revenue_service;
pub mod subscription_service;
