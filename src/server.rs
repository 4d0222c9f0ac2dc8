use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::action::{ActionContext, ActionRegistry};
use crate::capability::{CapabilityPolicy, MemoryProfileStore, PgProfileStore, ProfileStore};
use crate::config::{AppConfig, StoreKind};
use crate::records::{MemoryRecordStore, PgRecordStore};
use crate::database::DatabaseManager;
use crate::handlers;
use crate::middleware::session_credentials_middleware;
use crate::session::JwtSessionStore;

/// HTTP-level settings taken from `AppConfig`
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub session_cookie: String,
    pub max_request_size_bytes: usize,
    pub cors_origins: Vec<String>,
    pub enable_request_logging: bool,
}

impl ServerSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            session_cookie: config.security.session_cookie.clone(),
            max_request_size_bytes: config.api.max_request_size_bytes,
            cors_origins: config.security.cors_origins.clone(),
            enable_request_logging: config.api.enable_request_logging,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub actions: Arc<ActionRegistry>,
    pub context: ActionContext,
    pub settings: Arc<ServerSettings>,
}

impl AppState {
    pub fn new(actions: ActionRegistry, context: ActionContext, settings: ServerSettings) -> Self {
        Self {
            actions: Arc::new(actions),
            context,
            settings: Arc::new(settings),
        }
    }

    /// Wires the configured session and profile stores behind the built-in actions
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let sessions = JwtSessionStore::new(config.security.jwt_secret.clone(), config.security.jwt_audience.clone())
            .context("JWT secret must be set (SECURITY_JWT_SECRET)")?;
        let profiles = profile_store(config).await?;
        let policy = CapabilityPolicy {
            capability_admin_grant: config.security.capability_admin_grant,
        };

        if !policy.capability_admin_grant {
            tracing::info!("'admin' capability entries no longer grant every capability");
        }

        let context = ActionContext::new(Arc::new(sessions), profiles, policy);
        let context = with_record_store(context, config).await?;
        Ok(Self::new(crate::actions::registry(), context, ServerSettings::from_config(config)))
    }
}

async fn with_record_store(context: ActionContext, config: &AppConfig) -> anyhow::Result<ActionContext> {
    match config.records.store {
        StoreKind::Memory => {
            if !crate::is_development!() {
                tracing::warn!("Using the in-memory record store outside development");
            }
            tracing::info!("In-memory record store ready");
            Ok(context.with_records(Arc::new(MemoryRecordStore::new())))
        }
        StoreKind::Postgres => {
            let pool = DatabaseManager::pool(&config.database)
                .await
                .context("failed to connect to the records database")?;
            let store = PgRecordStore::new(pool, &config.records)?;
            tracing::info!(
                "Postgres record store ready (tables {}, {}, {})",
                config.records.listings_table,
                config.records.content_table,
                config.records.messages_table
            );
            Ok(context.with_records(Arc::new(store)))
        }
    }
}

pub async fn profile_store(config: &AppConfig) -> anyhow::Result<Arc<dyn ProfileStore>> {
    match config.profiles.store {
        StoreKind::Memory => {
            let store = match &config.profiles.seed_file {
                Some(path) => MemoryProfileStore::from_yaml_file(path)
                    .with_context(|| format!("failed to load profile seed {}", path))?,
                None => MemoryProfileStore::new(),
            };
            if !crate::is_development!() {
                tracing::warn!("Using the in-memory profile store outside development");
            }
            tracing::info!("In-memory profile store ready with {} profile(s)", store.len().await);
            Ok(Arc::new(store))
        }
        StoreKind::Postgres => {
            let pool = DatabaseManager::pool(&config.database)
                .await
                .context("failed to connect to the profile database")?;
            let store = PgProfileStore::new(pool, &config.profiles.table)?;
            tracing::info!("Postgres profile store ready (table {})", config.profiles.table);
            Ok(Arc::new(store))
        }
    }
}

pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(handlers::system::root))
        .route("/health", get(handlers::system::health))
        // Actions
        .route("/actions", get(handlers::actions::list))
        .route("/actions/:name", post(handlers::actions::invoke))
        // Session-aware API
        .route("/api/auth/whoami", get(handlers::auth::whoami))
        .route("/api/auth/capabilities/:capability", get(handlers::auth::capability))
        .layer(middleware::from_fn_with_state(state.clone(), session_credentials_middleware))
        .layer(DefaultBodyLimit::max(state.settings.max_request_size_bytes))
        .layer(cors_layer(&state.settings.cors_origins));

    if state.settings.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub async fn serve(config: &AppConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(config).await?;
    tracing::info!("Registered {} action(s)", state.actions.len());

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Nyuchi actions API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    DatabaseManager::close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
