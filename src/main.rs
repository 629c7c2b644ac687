mod config;
mod db;
mod models;
mod responses;
mod routes;
mod session;
mod state;
pub mod utils;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::HeaderValue;
use axum::http::Method;
use axum::{
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use config::Config;
use db::postgres_user_repository::PostgresUserRepository;
use responses::JsonResponse;
use routes::account::handle_update_subscription;
use routes::auth::{
    handle_login, handle_logout, handle_me, handle_signup, handle_verify_token,
};
use sqlx::PgPool;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use utils::jwt::TokenKeys;

use crate::state::AppState;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).unwrap();

    let config = Config::from_env();

    let token_keys = TokenKeys::from_config(&config).expect("TOKEN_SECRET is not usable");

    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    let app_state = AppState {
        db: Arc::new(PostgresUserRepository { pool }),
        token_keys: Arc::new(token_keys),
        config: Arc::new(config),
    };

    let rate_limit_auth_s: u64 = std::env::var("RATE_LIMITER_AUTH_SECONDS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(1);
    let rate_limit_auth_burst: u32 = std::env::var("RATE_LIMITER_AUTH_BURST")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(10);
    // Stricter limiter for /api/auth/*
    let auth_governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(rate_limit_auth_s)
            .burst_size(rate_limit_auth_burst)
            .use_headers()
            .error_handler(|_err| {
                JsonResponse::too_many_requests(
                    "Too many requests. Please wait a moment and try again.",
                )
                .into_response()
            })
            .finish()
            .unwrap(),
    );

    let cors = CorsLayer::new()
        .allow_origin(
            app_state
                .config
                .frontend_origin
                .parse::<HeaderValue>()
                .expect("FRONTEND_ORIGIN must be a valid origin"),
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true);

    let auth_routes = Router::new()
        .route("/signup", post(handle_signup))
        .route("/login", post(handle_login))
        .route("/logout", post(handle_logout))
        .route("/verify", post(handle_verify_token))
        .route("/me", get(handle_me))
        .layer(GovernorLayer {
            config: auth_governor_conf,
        });

    let app = Router::new()
        .nest("/api/auth", auth_routes)
        .route("/api/account/subscription", put(handle_update_subscription))
        .route("/api/health", get(|| async { JsonResponse::success("ok") }))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 8080));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
