use super::error::FilterError;
use super::filter_where::validate_identifier;
use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    pub fn parse(column: &str, sort: SortDirection) -> Result<FilterOrderInfo, FilterError> {
        validate_identifier(column).map_err(FilterError::InvalidColumn)?;
        Ok(FilterOrderInfo { column: column.to_string(), sort })
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}
