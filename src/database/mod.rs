pub mod manager;
pub mod models;
pub mod query_builder;
pub mod repository;

pub use manager::{DatabaseError, StockTable};
pub use repository::{PatternSearch, PatternStore, PgPatternStore};
