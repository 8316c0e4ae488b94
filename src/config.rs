// config.rs
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_maxage: i64,
    pub port: u16,
    pub redis_url: Option<String>,
    // Media storage
    pub upload_dir: String,
    pub public_media_url: String,
    // Logging
    pub app_env: String,
    pub log_dir: String,
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        let jwt_maxage = std::env::var("JWT_MAXAGE")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(60);
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8000);

        let redis_url = std::env::var("REDIS_URL").ok().filter(|v| !v.is_empty());

        let upload_dir = std::env::var("UPLOAD_DIR")
            .unwrap_or_else(|_| "uploads".to_string());
        let public_media_url = std::env::var("PUBLIC_MEDIA_URL")
            .unwrap_or_else(|_| "/media".to_string());

        let app_env = std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string());
        let log_dir = std::env::var("LOG_DIR")
            .unwrap_or_else(|_| "logs".to_string());

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_else(|_| vec![
                "http://localhost:5173".to_string(),
                "http://localhost:8000".to_string(),
            ]);

        Config {
            database_url,
            jwt_secret,
            jwt_maxage,
            port,
            redis_url,
            upload_dir,
            public_media_url,
            app_env,
            log_dir,
            allowed_origins,
        }
    }

    /// Standalone scripts only need the connection string.
    pub fn database_url_only() -> Result<String, std::env::VarError> {
        std::env::var("DATABASE_URL")
    }

    /// `(production, log_dir)` for scripts that skip the full config.
    pub fn logging_only() -> (bool, String) {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());
        (is_production_env(&app_env), log_dir)
    }

    pub fn is_production(&self) -> bool {
        is_production_env(&self.app_env)
    }
}

fn is_production_env(app_env: &str) -> bool {
    app_env.trim().eq_ignore_ascii_case("production")
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
