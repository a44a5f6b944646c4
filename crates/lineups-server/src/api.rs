use axum::extract::{Path, State};
use axum::response::Json;

use lineups_core::code::{is_valid_session_code, normalize_session_code};
use lineups_core::contest::Contest;
use lineups_core::session::SessionSnapshot;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/v1/contests: every contest with its full starter list.
pub async fn list_contests(State(state): State<AppState>) -> Json<Vec<Contest>> {
    Json(state.catalog.contests().to_vec())
}

/// GET /api/v1/sessions/{code}: current snapshot of one session.
pub async fn get_session(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let code = normalize_session_code(&code);
    if !is_valid_session_code(&code) {
        return Err(AppError::BadRequest("Invalid session code".to_string()));
    }
    let registry = state.registry.read().await;
    registry
        .snapshot(&code)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))
}
