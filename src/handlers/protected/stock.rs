use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};

use crate::database::models::PatternRecord;
use crate::error::ApiError;
use crate::handlers::params::{self, DateQuery};
use crate::AppState;

/// GET /stock/:symbol - full history from the symbol's own table
///
/// The symbol is case-insensitive. It must pass the `StockTable`
/// allow-list, checked alongside the date parameters, before it is used as
/// part of a table name.
pub async fn get(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<Vec<PatternRecord>>, ApiError> {
    let Path(symbol) = path.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let (table, dates) = params::extract(query)?.validate_for(&symbol)?;

    let rows = state
        .store
        .stock_history(&table, dates)
        .await
        .map_err(|e| ApiError::data_access(format!("Error fetching data from `{}`", table), e))?;
    Ok(Json(rows))
}
