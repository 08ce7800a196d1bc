use std::env;

/// Environment configuration
/// Loads and validates environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub session_secret: String,
    pub bind_addr: String,
    pub mail_outbox_dir: String,
    pub allowed_origins: Vec<String>,
    pub auto_verify_enabled: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());

        let session_secret =
            env::var("SESSION_SECRET").map_err(|_| "SESSION_SECRET must be set".to_string())?;

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let mail_outbox_dir =
            env::var("MAIL_OUTBOX_DIR").unwrap_or_else(|_| "var/emails".to_string());

        let allowed_origins: Vec<String> = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:8080".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if allowed_origins.is_empty() {
            return Err("ALLOWED_ORIGINS must contain at least one origin".to_string());
        }

        let auto_verify_enabled = env::var("AUTO_VERIFY_ENABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            database_url,
            session_secret,
            bind_addr,
            mail_outbox_dir,
            allowed_origins,
            auto_verify_enabled,
        })
    }
}
