use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub service_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://chatstore.db?mode=rwc".to_string());

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "20".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidMaxConnections)?;

        let service_name = env::var("SERVICE_NAME").unwrap_or_else(|_| "chatstore".to_string());

        Ok(Config {
            database_url,
            database_max_connections,
            service_name,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid DATABASE_MAX_CONNECTIONS value")]
    InvalidMaxConnections,
}
