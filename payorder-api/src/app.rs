/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use payorder_api::{app::{build_router, AppState}, config::Config};
/// use payorder_shared::redis::{RedisClient, StreamWriter};
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let redis = RedisClient::new(config.redis.clone()).await?;
/// let jobs = Arc::new(StreamWriter::new(redis, config.jobs.stream_key.clone()));
///
/// let app = build_router(AppState::new(pool, config, jobs));
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use payorder_shared::jobs::PaymentJobPublisher;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Where new payment jobs are published
    pub jobs: Arc<dyn PaymentJobPublisher>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config, jobs: Arc<dyn PaymentJobPublisher>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            jobs,
        }
    }
}

/// Builds the Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET  /health
/// ├── /users
/// │   ├── POST /
/// │   ├── GET  /
/// │   └── GET  /:user_id
/// └── /payment-orders
///     ├── POST /
///     ├── GET  /
///     └── GET  /:payment_order_id
/// ```
///
/// Every request is traced at INFO level and passes through CORS.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let user_routes = Router::new()
        .route("/", get(routes::users::list_users).post(routes::users::create_user))
        .route("/:user_id", get(routes::users::get_user));

    let payment_order_routes = Router::new()
        .route(
            "/",
            get(routes::payment_orders::list_payment_orders)
                .post(routes::payment_orders::create_payment_order),
        )
        .route(
            "/:payment_order_id",
            get(routes::payment_orders::get_payment_order),
        );

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins = allowed_origins(&state.config.api.cors_origins);

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/users", user_routes)
        .nest("/payment-orders", payment_order_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Parses configured CORS origins, skipping (and logging) invalid ones
fn allowed_origins(configured: &[String]) -> Vec<HeaderValue> {
    configured
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect()
}
