use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::{validate_identifier, FilterWhere};
use super::types::{FilterOrderInfo, Page, SelectColumn, SortDirection, SqlResult};

/// Single-table SELECT statement under construction
#[derive(Debug, Clone)]
pub struct Filter {
    table_name: String,
    select_columns: Vec<SelectColumn>,
    where_data: FilterWhere,
    order_data: Vec<FilterOrderInfo>,
    page: Option<Page>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        Self::validate_table_name(&table_name)?;
        Ok(Self {
            table_name,
            select_columns: vec![],
            where_data: FilterWhere::new(),
            order_data: vec![],
            page: None,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn select(&mut self, columns: &[SelectColumn]) -> Result<&mut Self, FilterError> {
        Self::validate_select_columns(columns)?;
        self.select_columns = columns.to_vec();
        Ok(self)
    }

    /// Mutable access to the WHERE builder
    pub fn where_clause(&mut self) -> &mut FilterWhere {
        &mut self.where_data
    }

    pub fn order(&mut self, column: &str, sort: SortDirection) -> Result<&mut Self, FilterError> {
        self.order_data.push(FilterOrder::parse(column, sort)?);
        Ok(self)
    }

    pub fn paginate(&mut self, page: Page) -> Result<&mut Self, FilterError> {
        if page.page == 0 {
            return Err(FilterError::InvalidOffset("Page must be at least 1".to_string()));
        }
        if page.limit == 0 || page.limit > Page::MAX_LIMIT {
            return Err(FilterError::InvalidLimit(format!(
                "Limit must be between 1 and {}",
                Page::MAX_LIMIT
            )));
        }
        self.page = Some(page);
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let select_clause = self.build_select_clause();
        let (where_clause, mut params) = self.where_data.generate()?;
        let order_clause = FilterOrder::generate(&self.order_data);

        let limit_clause = match self.page {
            Some(page) => {
                let limit_slot = params.len() + 1;
                params.push(i64::from(page.limit).into());
                params.push(page.offset().into());
                format!("LIMIT ${} OFFSET ${}", limit_slot, limit_slot + 1)
            }
            None => String::new(),
        };

        let query = [
            format!("SELECT {}", select_clause),
            format!("FROM \"{}\"", self.table_name),
            format!("WHERE {}", where_clause),
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params })
    }

    fn validate_table_name(name: &str) -> Result<(), FilterError> {
        validate_identifier(name).map_err(FilterError::InvalidTableName)
    }

    fn validate_select_columns(columns: &[SelectColumn]) -> Result<(), FilterError> {
        for column in columns {
            validate_identifier(column.name).map_err(FilterError::InvalidColumn)?;
            if let Some(cast) = column.cast {
                if !cast.chars().all(|c| c.is_ascii_alphabetic() || c == ' ') {
                    return Err(FilterError::InvalidColumn(format!(
                        "Invalid cast for {}: {}",
                        column.name, cast
                    )));
                }
            }
        }
        Ok(())
    }

    fn build_select_clause(&self) -> String {
        if self.select_columns.is_empty() {
            return "*".to_string();
        }
        self.select_columns
            .iter()
            .map(|c| match c.cast {
                Some(cast) => format!("\"{0}\"::{1} AS \"{0}\"", c.name, cast),
                None => format!("\"{}\"", c.name),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}
