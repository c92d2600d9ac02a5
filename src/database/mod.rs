use sqlx::{any::AnyPoolOptions, AnyPool};

use crate::config::Config;

pub mod messages;

#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
}

impl Database {
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        Self::connect_with(database_url, 20).await
    }

    pub async fn connect_from_config(config: &Config) -> Result<Self, sqlx::Error> {
        Self::connect_with(&config.database_url, config.database_max_connections).await
    }

    async fn connect_with(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        // Enable foreign keys for SQLite
        if database_url.starts_with("sqlite") {
            sqlx::query("PRAGMA foreign_keys = ON")
                .execute(&pool)
                .await?;
        }

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("migrations/sqlite").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}
