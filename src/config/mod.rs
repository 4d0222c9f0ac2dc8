use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub profiles: ProfileConfig,
    pub records: RecordConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_audience: Option<String>,
    pub jwt_expiry_hours: u64,
    pub session_cookie: String,
    /// Treat a literal "admin" entry in a profile's capability list as a blanket grant.
    pub capability_admin_grant: bool,
}

/// Backend for profiles and platform records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub store: StoreKind,
    pub table: String,
    /// YAML file used to seed the in-memory store
    pub seed_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordConfig {
    pub store: StoreKind,
    pub listings_table: String,
    pub content_table: String,
    pub messages_table: String,
}

impl RecordConfig {
    fn with_store(store: StoreKind) -> Self {
        Self {
            store,
            listings_table: "listings".to_string(),
            content_table: "content".to_string(),
            messages_table: "contact_messages".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Some(v) = env::var("NYUCHI_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(v) = env::var("SECURITY_JWT_SECRET").ok().or_else(|| env::var("JWT_SECRET").ok()) {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_AUDIENCE") {
            self.security.jwt_audience = if v.trim().is_empty() { None } else { Some(v) };
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_SESSION_COOKIE") {
            self.security.session_cookie = v;
        }
        if let Ok(v) = env::var("SECURITY_CAPABILITY_ADMIN_GRANT") {
            self.security.capability_admin_grant = v.parse().unwrap_or(self.security.capability_admin_grant);
        }

        // Profile store overrides
        match env::var("PROFILE_STORE").as_deref() {
            Ok("memory") => self.profiles.store = StoreKind::Memory,
            Ok("postgres") | Ok("pg") => self.profiles.store = StoreKind::Postgres,
            _ => {}
        }
        if let Ok(v) = env::var("PROFILE_TABLE") {
            self.profiles.table = v;
        }
        if let Ok(v) = env::var("PROFILE_SEED_FILE") {
            self.profiles.seed_file = Some(v);
        }

        // Record store overrides
        match env::var("RECORD_STORE").as_deref() {
            Ok("memory") => self.records.store = StoreKind::Memory,
            Ok("postgres") | Ok("pg") => self.records.store = StoreKind::Postgres,
            _ => {}
        }
        if let Ok(v) = env::var("LISTINGS_TABLE") {
            self.records.listings_table = v;
        }
        if let Ok(v) = env::var("CONTENT_TABLE") {
            self.records.content_table = v;
        }
        if let Ok(v) = env::var("CONTACT_MESSAGES_TABLE") {
            self.records.messages_table = v;
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 5,
                connection_timeout: 30,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: "nyuchi-development-secret".to_string(),
                jwt_audience: Some("authenticated".to_string()),
                jwt_expiry_hours: 24 * 7,
                session_cookie: "sb-access-token".to_string(),
                capability_admin_grant: true,
            },
            profiles: ProfileConfig {
                store: StoreKind::Memory,
                table: "profiles".to_string(),
                seed_file: None,
            },
            records: RecordConfig::with_store(StoreKind::Memory),
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 10,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.nyuchi.com".to_string()],
                jwt_secret: String::new(),
                jwt_audience: Some("authenticated".to_string()),
                jwt_expiry_hours: 24,
                session_cookie: "sb-access-token".to_string(),
                capability_admin_grant: true,
            },
            profiles: ProfileConfig {
                store: StoreKind::Postgres,
                table: "profiles".to_string(),
                seed_file: None,
            },
            records: RecordConfig::with_store(StoreKind::Postgres),
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 5,
            },
            api: ApiConfig {
                port: 8080,
                enable_request_logging: false,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                cors_origins: vec!["https://nyuchi.com".to_string(), "https://www.nyuchi.com".to_string()],
                jwt_secret: String::new(),
                jwt_audience: Some("authenticated".to_string()),
                jwt_expiry_hours: 1,
                session_cookie: "sb-access-token".to_string(),
                capability_admin_grant: true,
            },
            profiles: ProfileConfig {
                store: StoreKind::Postgres,
                table: "profiles".to_string(),
                seed_file: None,
            },
            records: RecordConfig::with_store(StoreKind::Postgres),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.profiles.store, StoreKind::Memory);
        assert_eq!(config.records.store, StoreKind::Memory);
        assert!(!config.security.jwt_secret.is_empty());
        assert_eq!(config.security.session_cookie, "sb-access-token");
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.profiles.store, StoreKind::Postgres);
        assert_eq!(config.records.listings_table, "listings");
        // Production must be given a secret explicitly
        assert!(config.security.jwt_secret.is_empty());
        assert_eq!(config.security.jwt_audience.as_deref(), Some("authenticated"));
    }
}
