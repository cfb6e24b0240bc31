use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

use crate::filter::SelectColumn;

/// One day of price data for a symbol, with the patterns it matched
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct PatternRecord {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub prev_close: f64,
    pub avg_price: f64,
    /// Bitmask of matched patterns, decoded through `pattern_rank_lookup`.
    /// Null in per-symbol tables for days without a computed value.
    pub pattern_value: Option<i64>,
    pub matched_patterns: Option<String>,
}

impl PatternRecord {
    /// Projection shared by every pattern query; casts pin the decoded types
    pub const COLUMNS: [SelectColumn; 11] = [
        SelectColumn::cast("symbol", "text"),
        SelectColumn::cast("date", "date"),
        SelectColumn::cast("open", "double precision"),
        SelectColumn::cast("high", "double precision"),
        SelectColumn::cast("low", "double precision"),
        SelectColumn::cast("close", "double precision"),
        SelectColumn::cast("volume", "double precision"),
        SelectColumn::cast("prev_close", "double precision"),
        SelectColumn::cast("avg_price", "double precision"),
        SelectColumn::cast("pattern_value", "bigint"),
        SelectColumn::cast("matched_patterns", "text"),
    ];

    /// True when every bit of `mask` is set in this row's pattern value
    pub fn matches_mask(&self, mask: i64) -> bool {
        self.pattern_value.map_or(false, |v| (v & mask) == mask)
    }
}
