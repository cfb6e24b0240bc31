pub mod pattern;
pub mod pattern_rank;

pub use pattern::PatternRecord;
pub use pattern_rank::PatternRankLookup;
