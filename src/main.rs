//! ImpactMakers Backend
//!
//! REST backend for the ImpactMakers volunteering platform: volunteer posts and
//! requests, events, blogs, notification email and cookie-based JWT sessions.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod mail;
mod models;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::TokenIssuer;
use config::Config;
use db::Repository;
use mail::{DisabledMailer, Mailer, SmtpMailer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub tokens: Arc<TokenIssuer>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(config.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!config.log_json).then(|| tracing_subscriber::fmt::layer()))
        .init();

    tracing::info!("Starting ImpactMakers Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Environment: {:?}", config.environment);

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    if let Some(seed_path) = &config.seed_path {
        let inserted = db::seed_from_file(&repo, seed_path).await?;
        tracing::info!("Seeded {} documents from {:?}", inserted, seed_path);
    }

    let secret = match &config.token_secret {
        Some(secret) => secret.clone(),
        None => {
            tracing::warn!(
                "No token secret configured (IMPACT_TOKEN_SECRET). Sessions will not survive a restart!"
            );
            format!(
                "{}{}",
                uuid::Uuid::new_v4().simple(),
                uuid::Uuid::new_v4().simple()
            )
        }
    };
    let tokens = Arc::new(TokenIssuer::new(secret.as_bytes(), config.token_ttl_minutes));

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp, &config.mail_from)?),
        None => {
            tracing::warn!("No mail relay configured (IMPACT_SMTP_HOST). Email sending is disabled!");
            Arc::new(DisabledMailer)
        }
    };

    // Create application state
    let state = AppState {
        repo: repo.clone(),
        tokens,
        mailer,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Impact Makers running on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Shutdown hook: release the store only after in-flight requests drained.
    repo.close().await;
    tracing::info!("Database pool closed, shutdown complete");

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    // Routes that need a session cookie
    let session_routes = Router::new()
        .route("/volunteer-post/{id}", get(api::get_post))
        .route("/volunteers-posts/{email}", get(api::list_organizer_posts))
        .route("/update-post/{id}", patch(api::update_post))
        .route("/delete-post/{id}", delete(api::delete_post))
        .route(
            "/volunteer-request/{email}",
            get(api::list_volunteer_requests),
        )
        .route("/volunteer-req-cancel/{id}", delete(api::cancel_request))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    let public_routes = Router::new()
        // Posts
        .route("/volunteers-posts", get(api::list_posts).post(api::create_post))
        .route("/count", get(api::count_posts))
        // Requests
        .route("/volunteer-request", post(api::create_request))
        // Content
        .route("/events", get(api::list_events))
        .route("/blogs", get(api::list_blogs))
        .route("/blog/{id}", get(api::get_blog))
        // Notifications
        .route("/send-email", post(api::send_email))
        // Session
        .route("/jwt", post(api::issue_token))
        .route("/log-out", post(api::log_out))
        // Liveness
        .route("/", get(liveness));

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Credentialed CORS for the configured frontend origins.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

/// Liveness endpoint.
async fn liveness() -> &'static str {
    "Impact Makers running....."
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
