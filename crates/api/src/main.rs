//! ContentForge API server.
//!
//! Serves the JSON API under `/api` plus `/health` and `/health/ready`.
//! Migrations are applied separately with `cf-cli migrate`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::State;
use axum::http::{Request, Response, StatusCode};
use axum::{Router, routing::get};
use sentry::integrations::tracing::{self as sentry_tracing, EventFilter};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::{Level, Metadata, Span};
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use contentforge_api::config::ApiConfig;
use contentforge_api::db;
use contentforge_api::middleware::{cors_layer, create_session_layer, request_id_middleware};
use contentforge_api::routes;
use contentforge_api::state::AppState;

const DEFAULT_LOG_FILTER: &str = "contentforge_api=info,tower_http=debug";

/// Start Sentry when a DSN is configured. Keep the guard alive for the
/// lifetime of the process.
fn init_sentry(config: &ApiConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_deref()?;
    let options = sentry::ClientOptions {
        release: sentry::release_name!(),
        environment: config.sentry_environment.clone().map(Into::into),
        sample_rate: config.sentry_sample_rate,
        traces_sample_rate: config.sentry_traces_sample_rate,
        attach_stacktrace: true,
        // Request bodies carry vendor credentials
        send_default_pii: false,
        ..Default::default()
    };
    Some(sentry::init((dsn, options)))
}

/// Warnings and errors become Sentry events, info and debug breadcrumbs.
fn sentry_filter(metadata: &Metadata<'_>) -> EventFilter {
    match *metadata.level() {
        Level::ERROR | Level::WARN => EventFilter::Event,
        Level::INFO | Level::DEBUG => EventFilter::Breadcrumb,
        _ => EventFilter::Ignore,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    // Fly.io ships stdout to a log drain that parses JSON
    let on_fly = std::env::var_os("FLY_APP_NAME").is_some();
    let json = on_fly.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text = (!on_fly).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .with(sentry_tracing::layer().event_filter(sentry_filter))
        .init();
}

fn app(state: AppState, sessions: SessionManagerLayer<PostgresStore>) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
                status = tracing::field::Empty,
                latency_ms = tracing::field::Empty,
            )
        })
        .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
            span.record("status", response.status().as_u16());
            span.record(
                "latency_ms",
                u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
            );
            DefaultOnResponse::default().on_response(response, latency, span);
        });

    let cors = cors_layer(&state.config().cors_origins);

    let router = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .layer(sessions)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(trace)
        .with_state(state);
    let router = match cors {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router
        // Outermost so every request gets a hub and a transaction
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

#[tokio::main]
async fn main() {
    let config = ApiConfig::from_env().expect("Failed to load configuration");

    // The tracing layer needs the Sentry client, so Sentry goes first
    let _sentry = init_sentry(&config);
    init_tracing();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to the database");
    let session_layer = create_session_layer(&pool, &config);
    let addr = config.socket_addr();

    let state = AppState::new(config, pool).expect("Failed to build application state");
    tracing::info!(
        providers = ?state.ai().available(),
        research = state.serper().is_some(),
        "ContentForge API starting"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    tracing::info!(%addr, "Listening");

    // ConnectInfo is the rate limiter's fallback key
    axum::serve(
        listener,
        app(state, session_layer).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");
}

async fn health() -> &'static str {
    "ok"
}

/// 503 until the database answers.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    if sqlx::query("SELECT 1").execute(state.pool()).await.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutting down");
}
