// handlers/protected/mod.rs - Handlers behind the API key gate
//
// Each handler validates its query/path parameters first and only then
// touches the store, so malformed requests never reach the database.
pub mod pattern_rank;
pub mod patterns;
pub mod stock;

pub use pattern_rank::list as pattern_rank_list;
pub use patterns::{latest as patterns_latest, search as patterns_search};
pub use stock::get as stock_get;
