pub mod api;
pub mod config;
pub mod error;
pub mod health;
pub mod registry;
pub mod state;
pub mod ws;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use lineups_core::contest::ContestCatalog;

use config::ServerConfig;
use state::AppState;

/// Build the Axum router and application state from a config and catalog.
pub fn build_app(config: ServerConfig, catalog: ContestCatalog) -> (Router<()>, AppState) {
    let web_root = config.web_root.clone();
    let state = AppState::new(config, catalog);

    let api_routes = Router::new()
        .route("/contests", get(api::list_contests))
        .route("/sessions/{code}", get(api::get_session));

    let app = Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .nest("/api/v1", api_routes)
        .fallback_service(ServeDir::new(&web_root))
        .layer(CorsLayer::permissive())
        .with_state(state.clone());

    (app, state)
}
