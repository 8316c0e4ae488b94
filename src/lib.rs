pub mod config;
pub mod db;
pub mod dtos;
pub mod error;
pub mod handler;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
pub mod utils;

use std::sync::Arc;

use config::Config;
use db::db::DBClient;
use service::media_store::MediaStore;

#[derive(Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<DBClient>,
    pub media_store: Arc<dyn MediaStore>,
}
