use axum::{
    http::Method,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod orders;
pub mod purchase;
pub mod state;
pub mod suppliers;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .route("/v1/{category}/purchase", post(purchase::create_purchase))
        .route("/v1/webhooks/payments", post(purchase::payment_webhook))
        .route("/v1/orders/{short_id}", get(orders::get_order))
        .route("/v1/admin/orders/refresh-all", post(orders::refresh_all))
        .route(
            "/v1/admin/orders/{short_id}/refresh",
            post(orders::refresh_order),
        )
        .route(
            "/v1/admin/orders/{short_id}/retry",
            post(orders::retry_order),
        )
        .route("/v1/admin/suppliers", get(suppliers::list_active))
        .route(
            "/v1/admin/suppliers/balances",
            get(suppliers::wallet_balances),
        )
        .route(
            "/v1/admin/suppliers/{category}",
            put(suppliers::set_active),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
