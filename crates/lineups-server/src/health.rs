use std::sync::atomic::Ordering;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

/// Structured health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub connections: ConnectionInfo,
    pub sessions: SessionInfo,
}

#[derive(Serialize)]
pub struct ConnectionInfo {
    pub websocket: usize,
}

#[derive(Serialize)]
pub struct SessionInfo {
    pub active: usize,
    pub participants: usize,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let ws = state.ws_connection_count.load(Ordering::Relaxed);

    let (active, participants) = {
        let registry = state.registry.read().await;
        registry.stats()
    };

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        connections: ConnectionInfo { websocket: ws },
        sessions: SessionInfo {
            active,
            participants,
        },
    })
}

/// Readiness check: the server can host sessions once a catalog is loaded.
pub async fn readiness_check(State(state): State<AppState>) -> &'static str {
    if state.catalog.is_empty() {
        return "not ready: no contests loaded";
    }
    "ready"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            status: "healthy",
            version: "0.1.0",
            connections: ConnectionInfo { websocket: 5 },
            sessions: SessionInfo {
                active: 1,
                participants: 2,
            },
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"healthy\""));
        assert!(json.contains("\"websocket\":5"));
        assert!(json.contains("\"participants\":2"));
    }
}
