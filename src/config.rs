use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub tenant_database_url: Option<String>,
    pub jwt_secret: String,
    pub admin_email: String,
    pub admin_password_hash: String,
    pub data_dir: PathBuf,
    pub host: IpAddr,
    pub port: u16,
    pub store_timeout: Duration,
    pub trial_days: i64,
    pub max_body_size: usize,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = env_required("JWT_SECRET")?;
        let admin_email = env_required("FRONTDESK_ADMIN_EMAIL")?;
        let admin_password_hash = env_required("FRONTDESK_ADMIN_PASSWORD_HASH")?;

        let database_url = env_optional("DATABASE_URL");

        let tenant_database_url = env_optional("FRONTDESK_TENANT_DATABASE_URL");
        if let Some(template) = &tenant_database_url {
            if !template.contains("{tenant}") {
                return Err(
                    "FRONTDESK_TENANT_DATABASE_URL must contain a {tenant} placeholder".to_string(),
                );
            }
        }

        let data_dir = PathBuf::from(env_or("FRONTDESK_DATA_DIR", "data"));

        let host: IpAddr = env_or("FRONTDESK_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid FRONTDESK_HOST: {e}"))?;

        let port: u16 = env_or("FRONTDESK_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid FRONTDESK_PORT: {e}"))?;

        let timeout_ms: u64 = env_or("FRONTDESK_STORE_TIMEOUT_MS", "3000")
            .parse()
            .map_err(|e| format!("Invalid FRONTDESK_STORE_TIMEOUT_MS: {e}"))?;

        let trial_days: i64 = env_or("FRONTDESK_TRIAL_DAYS", "14")
            .parse()
            .map_err(|e| format!("Invalid FRONTDESK_TRIAL_DAYS: {e}"))?;

        let max_body_size: usize = env_or("FRONTDESK_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid FRONTDESK_MAX_BODY_SIZE: {e}"))?;

        let log_level = env_or("FRONTDESK_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            tenant_database_url,
            jwt_secret,
            admin_email,
            admin_password_hash,
            data_dir,
            host,
            port,
            store_timeout: Duration::from_millis(timeout_ms),
            trial_days,
            max_body_size,
            log_level,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
