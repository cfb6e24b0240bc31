use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};

use crate::database::models::PatternRecord;
use crate::error::ApiError;
use crate::handlers::params::{self, PageQuery, SearchQuery};
use crate::AppState;

/// GET /patterns/latest - newest rows carrying a pattern value
pub async fn latest(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Vec<PatternRecord>>, ApiError> {
    let page = params::extract(query)?.validate()?;

    let rows = state
        .store
        .latest_patterns(page)
        .await
        .map_err(|e| ApiError::data_access("Error fetching latest patterns", e))?;
    Ok(Json(rows))
}

/// GET /patterns/search - conjunctive filter over symbol, bitmask and date range
pub async fn search(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<PatternRecord>>, ApiError> {
    let (search, page) = params::extract(query)?.validate()?;

    let rows = state
        .store
        .search_patterns(&search, page)
        .await
        .map_err(|e| ApiError::data_access("Error while filtering patterns", e))?;
    Ok(Json(rows))
}
