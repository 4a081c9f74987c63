use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod services;

use auth::rate_limit::RateLimiter;
use config::Config;
use db::PgGoalStore;
use services::{calendar, recalc, scheduler};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub goal_store: PgGoalStore,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(db: PgPool, config: Arc<Config>) -> Self {
        Self {
            goal_store: PgGoalStore::new(db.clone()),
            db,
            config,
            rate_limiter: RateLimiter::new(),
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let mut origins: Vec<axum::http::HeaderValue> = Vec::new();
    match config.frontend_url.parse() {
        Ok(origin) => origins.push(origin),
        Err(_) => tracing::warn!(url = %config.frontend_url, "FRONTEND_URL is not a valid origin"),
    }
    if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
        for o in extra.split(',') {
            if let Ok(hv) = o.trim().parse::<axum::http::HeaderValue>() {
                origins.push(hv);
            }
        }
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true)
}

fn app(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_auth,
        ));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .merge(auth_routes);

    let protected_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        // Profile
        .route(
            "/api/me",
            get(handlers::profile::me)
                .put(handlers::profile::update_me)
                .delete(handlers::profile::delete_me),
        )
        // Goals
        .route(
            "/api/goals/target-weight",
            put(handlers::goals::set_target_weight),
        )
        .route(
            "/api/goals/weekly-summary",
            get(handlers::goals::weekly_summary),
        )
        .route(
            "/api/goals/manual-update",
            post(handlers::goals::manual_update),
        )
        .route(
            "/api/goals/tdee-estimate",
            get(handlers::goals::tdee_estimate),
        )
        // Daily logs
        .route(
            "/api/logs",
            post(handlers::daily_logs::upsert_daily_log).get(handlers::daily_logs::list_daily_logs),
        )
        .route(
            "/api/logs/:id",
            put(handlers::daily_logs::update_daily_log)
                .delete(handlers::daily_logs::delete_daily_log),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let cors = cors_layer(&state.config);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn spawn_goal_recalculation(state: &AppState) -> scheduler::SchedulerHandle {
    let store = state.goal_store.clone();
    scheduler::spawn(
        "weekly_goal_recalculation",
        state.config.recalc_schedule(),
        move || {
            let store = store.clone();
            async move {
                recalc::run_weekly_job(&store, calendar::today()).await;
            }
        },
    )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fittrack_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    let db = db::create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    tracing::info!("Database migrations applied");

    let state = AppState::new(db, config.clone());
    state.rate_limiter.spawn_cleanup_worker();

    let recalc_scheduler = if config.goal_recalc_enabled {
        Some(spawn_goal_recalculation(&state))
    } else {
        tracing::warn!("Weekly goal recalculation disabled");
        None
    };

    let app = app(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    // Connect info feeds the per-IP rate limiter.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if let Some(handle) = recalc_scheduler {
        handle.shutdown().await;
    }
    Ok(())
}
