use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Process-wide connection pool for the platform database
pub struct DatabaseManager;

static POOL: OnceCell<PgPool> = OnceCell::const_new();

impl DatabaseManager {
    /// Shared pool, connected lazily on first use from `DATABASE_URL`
    pub async fn pool(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        POOL.get_or_try_init(|| async {
            let url = Self::database_url()?;
            Self::connect(&url, config).await
        })
        .await
        .cloned()
    }

    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        url::Url::parse(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool (max_connections={})", config.max_connections);
        Ok(pool)
    }

    fn database_url() -> Result<String, DatabaseError> {
        std::env::var("DATABASE_URL").map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Close the shared pool (e.g., on shutdown)
    pub async fn close() {
        if let Some(pool) = POOL.get() {
            pool.close().await;
            info!("Closed database pool");
        }
    }

    /// Quote SQL identifier to prevent injection
    pub fn quote_identifier(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Table names accepted from configuration: optional schema prefix,
    /// then ASCII letters, digits and underscores.
    pub fn is_valid_identifier(name: &str) -> bool {
        let valid_part = |part: &str| {
            !part.is_empty()
                && !part.starts_with(|c: char| c.is_ascii_digit())
                && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        };
        match name.split_once('.') {
            Some((schema, table)) => valid_part(schema) && valid_part(table),
            None => valid_part(name),
        }
    }

    /// Quote a validated, possibly schema-qualified table name
    pub fn qualified_table(name: &str) -> Result<String, DatabaseError> {
        if !Self::is_valid_identifier(name) {
            return Err(DatabaseError::InvalidIdentifier(name.to_string()));
        }
        Ok(name.split('.').map(Self::quote_identifier).collect::<Vec<_>>().join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_identifiers() {
        assert!(DatabaseManager::is_valid_identifier("profiles"));
        assert!(DatabaseManager::is_valid_identifier("public.profiles"));
        assert!(!DatabaseManager::is_valid_identifier("profiles; DROP TABLE users"));
        assert!(!DatabaseManager::is_valid_identifier("1profiles"));
        assert!(!DatabaseManager::is_valid_identifier("a.b.c"));
    }

    #[test]
    fn quotes_qualified_tables() {
        assert_eq!(DatabaseManager::qualified_table("public.profiles").unwrap(), "\"public\".\"profiles\"");
        assert!(DatabaseManager::qualified_table("bad-name").is_err());
    }
}
