use axum::{extract::State, Json};

use crate::database::models::PatternRankLookup;
use crate::error::ApiError;
use crate::AppState;

/// GET /pattern-rank - bit position → pattern name table
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<PatternRankLookup>>, ApiError> {
    let ranks = state
        .store
        .pattern_ranks()
        .await
        .map_err(|e| ApiError::data_access("Error fetching pattern ranks", e))?;
    Ok(Json(ranks))
}
