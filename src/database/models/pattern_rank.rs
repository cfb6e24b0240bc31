use serde::Serialize;
use sqlx::FromRow;

use crate::filter::SelectColumn;

/// Maps a pattern name to its bit in `pattern_value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct PatternRankLookup {
    pub pattern_name: String,
    pub bit_position: i32,
    pub pattern_value: i64,
}

impl PatternRankLookup {
    pub const COLUMNS: [SelectColumn; 3] = [
        SelectColumn::cast("pattern_name", "text"),
        SelectColumn::cast("bit_position", "integer"),
        SelectColumn::cast("pattern_value", "bigint"),
    ];

    /// `pattern_value == 2^bit_position` with a representable, non-negative bit
    pub fn is_consistent(&self) -> bool {
        (0..63).contains(&self.bit_position) && self.pattern_value == 1i64 << self.bit_position
    }
}
