use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod sweeper;

use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .merge(routes::rooms::routes())
        .merge(routes::negotiation::routes())
        .merge(routes::game::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
