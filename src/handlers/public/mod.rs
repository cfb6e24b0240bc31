// handlers/public/mod.rs - Public handlers (no API key required)
//
// Operational endpoints only; no pattern data is reachable from here.
pub mod health;

pub use health::get as health_get;
