use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod categories;
pub mod customers;
pub mod error;
pub mod invoices;
pub mod middleware;
pub mod offers;
pub mod pricing;
pub mod services;
pub mod settings;
pub mod state;

pub use error::AppError;
pub use state::{AppState, AuthConfig};

pub fn app(state: AppState) -> Router {
    app_with_cors(state, "*")
}

/// `cors_origin` is `*` or a single origin such as `https://offerte.example.ch`.
pub fn app_with_cors(state: AppState, cors_origin: &str) -> Router {
    let origin = match HeaderValue::from_str(cors_origin) {
        Ok(value) if cors_origin != "*" => AllowOrigin::exact(value),
        _ => AllowOrigin::from(Any),
    };

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let api = Router::new()
        .merge(pricing::routes())
        .merge(auth::routes(state.clone()))
        .merge(settings::routes(state.clone()))
        .merge(categories::routes(state.clone()))
        .merge(services::routes(state.clone()))
        .merge(customers::routes(state.clone()))
        .merge(offers::routes(state.clone()))
        .merge(invoices::routes(state.clone()));

    Router::new()
        .route("/api", get(health))
        .route("/api/", get(health))
        .nest("/api", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit_middleware,
        ))
        .with_state(state)
}

/// GET /api/
async fn health() -> Json<Value> {
    Json(json!({
        "service": "offerte-api",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "ok",
    }))
}
