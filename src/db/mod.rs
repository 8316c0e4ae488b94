pub mod admindb;
pub mod cache;
pub mod campaigndb;
pub mod db;
pub mod deliverabledb;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod subscriptiondb;
pub mod userdb;
