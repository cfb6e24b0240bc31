// Query-string validation shared by the protected handlers.
//
// Raw parameters arrive as optional strings so that every field can be
// checked and all problems reported together, instead of failing on the
// first value serde cannot parse.

use axum::extract::{rejection::QueryRejection, Query};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::database::{DatabaseError, PatternSearch, StockTable};
use crate::error::{ApiError, FieldErrors};
use crate::filter::{DateRange, Page};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub pattern_value: Option<String>,
    pub symbol: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Unwraps a query extraction, turning undecodable query strings into a 400
pub fn extract<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(q)| q)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

impl PageQuery {
    pub fn validate(&self) -> Result<Page, ApiError> {
        let mut v = Validator::default();
        let page = v.page(self.page.as_deref(), self.limit.as_deref());
        v.finish(page)
    }
}

impl SearchQuery {
    pub fn validate(&self) -> Result<(PatternSearch, Page), ApiError> {
        let mut v = Validator::default();
        let dates = v.date_range(self.start_date.as_deref(), self.end_date.as_deref());
        let pattern_value = self
            .pattern_value
            .as_deref()
            .and_then(|raw| v.integer("pattern_value", raw));
        // matched exactly; blank means no symbol filter
        let symbol = self
            .symbol
            .clone()
            .filter(|s| !s.trim().is_empty());
        let page = v.page(self.page.as_deref(), self.limit.as_deref());
        v.finish((PatternSearch { symbol, pattern_value, dates }, page))
    }
}

impl DateQuery {
    /// Checks the path symbol together with the date bounds so that every
    /// problem is reported in one response
    pub fn validate_for(&self, symbol: &str) -> Result<(StockTable, DateRange), ApiError> {
        let mut v = Validator::default();
        let table = v.stock_table(symbol);
        let dates = v.date_range(self.start_date.as_deref(), self.end_date.as_deref());
        match v.finish(table)? {
            Some(table) => Ok((table, dates)),
            None => Err(ApiError::invalid_field("symbol", "Invalid symbol")),
        }
    }
}

#[derive(Default)]
struct Validator {
    errors: FieldErrors,
}

impl Validator {
    fn reject(&mut self, field: &str, detail: impl Into<String>) {
        self.errors.insert(field.to_string(), detail.into());
    }

    fn integer(&mut self, field: &str, raw: &str) -> Option<i64> {
        match raw.trim().parse::<i64>() {
            Ok(n) => Some(n),
            Err(_) => {
                self.reject(field, "Input should be a valid integer");
                None
            }
        }
    }

    fn bounded(&mut self, field: &str, raw: Option<&str>, default: u32, max: Option<u32>) -> u32 {
        let Some(raw) = raw else { return default };
        let Some(n) = self.integer(field, raw) else { return default };
        if n < 1 {
            self.reject(field, "Input should be greater than 0");
            return default;
        }
        match max {
            Some(max) if n > i64::from(max) => {
                self.reject(field, format!("Input should be less than or equal to {}", max));
                default
            }
            _ => match u32::try_from(n) {
                Ok(n) => n,
                Err(_) => {
                    let detail = format!("Input should be less than or equal to {}", u32::MAX);
                    self.reject(field, detail);
                    default
                }
            },
        }
    }

    fn page(&mut self, page: Option<&str>, limit: Option<&str>) -> Page {
        Page {
            page: self.bounded("page", page, Page::DEFAULT_PAGE, None),
            limit: self.bounded("limit", limit, Page::DEFAULT_LIMIT, Some(Page::MAX_LIMIT)),
        }
    }

    fn date(&mut self, field: &str, raw: Option<&str>) -> Option<NaiveDate> {
        let raw = raw?;
        match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
            Ok(d) => Some(d),
            Err(_) => {
                self.reject(field, "Input should be a valid date in YYYY-MM-DD format");
                None
            }
        }
    }

    fn stock_table(&mut self, symbol: &str) -> Option<StockTable> {
        match StockTable::for_symbol(symbol) {
            Ok(table) => Some(table),
            Err(DatabaseError::InvalidSymbol(detail)) => {
                self.reject("symbol", detail);
                None
            }
            Err(other) => {
                self.reject("symbol", other.to_string());
                None
            }
        }
    }

    fn date_range(&mut self, start: Option<&str>, end: Option<&str>) -> DateRange {
        DateRange {
            start: self.date("start_date", start),
            end: self.date("end_date", end),
        }
    }

    fn finish<T>(self, value: T) -> Result<T, ApiError> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(ApiError::unprocessable_entity("Invalid request parameters", self.errors))
        }
    }
}
