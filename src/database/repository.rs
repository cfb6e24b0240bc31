use std::time::Duration;

use async_trait::async_trait;
use sqlx::{postgres::PgRow, FromRow, PgPool};

use crate::database::manager::{self, DatabaseError, StockTable};
use crate::database::models::{PatternRankLookup, PatternRecord};
use crate::database::query_builder::QueryBuilder;
use crate::filter::{DateRange, Filter, FilterError, Page, SortDirection};

pub const PATTERN_TABLE: &str = "common_stock_data";
pub const RANK_TABLE: &str = "pattern_rank_lookup";

/// Optional constraints for a pattern search. Absent fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternSearch {
    pub symbol: Option<String>,
    pub pattern_value: Option<i64>,
    pub dates: DateRange,
}

/// Read-only access to pattern data
#[async_trait]
pub trait PatternStore: Send + Sync {
    /// Rows with a pattern value, newest first
    async fn latest_patterns(&self, page: Page) -> Result<Vec<PatternRecord>, DatabaseError>;

    async fn search_patterns(
        &self,
        search: &PatternSearch,
        page: Page,
    ) -> Result<Vec<PatternRecord>, DatabaseError>;

    /// Every lookup row, ascending by bit position
    async fn pattern_ranks(&self) -> Result<Vec<PatternRankLookup>, DatabaseError>;

    /// Full history of one symbol, newest first
    async fn stock_history(
        &self,
        table: &StockTable,
        dates: DateRange,
    ) -> Result<Vec<PatternRecord>, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;
}

pub fn latest_filter(page: Page) -> Result<Filter, FilterError> {
    let mut filter = Filter::new(PATTERN_TABLE)?;
    filter.select(&PatternRecord::COLUMNS)?;
    filter.where_clause().is_not_null("pattern_value")?;
    order_newest_first(&mut filter)?;
    filter.paginate(page)?;
    Ok(filter)
}

pub fn search_filter(search: &PatternSearch, page: Page) -> Result<Filter, FilterError> {
    let mut filter = Filter::new(PATTERN_TABLE)?;
    filter.select(&PatternRecord::COLUMNS)?;

    let conditions = filter.where_clause();
    conditions.is_not_null("pattern_value")?;
    if let Some(symbol) = search.symbol.as_deref().filter(|s| !s.trim().is_empty()) {
        conditions.eq("symbol", "symbol", symbol)?;
    }
    if let Some(mask) = search.pattern_value {
        conditions.bits_all("pattern_value", "pattern_value", mask)?;
    }
    push_date_range(&mut filter, search.dates)?;

    order_newest_first(&mut filter)?;
    filter.paginate(page)?;
    Ok(filter)
}

pub fn rank_filter() -> Result<Filter, FilterError> {
    let mut filter = Filter::new(RANK_TABLE)?;
    filter.select(&PatternRankLookup::COLUMNS)?;
    filter.order("bit_position", SortDirection::Asc)?;
    Ok(filter)
}

pub fn stock_filter(table: &StockTable, dates: DateRange) -> Result<Filter, FilterError> {
    let mut filter = Filter::new(table.as_str())?;
    filter.select(&PatternRecord::COLUMNS)?;
    push_date_range(&mut filter, dates)?;
    filter.order("date", SortDirection::Desc)?;
    Ok(filter)
}

/// Total order for paginated pattern queries: many symbols share a date, and
/// `symbol` breaks the tie so successive pages never overlap.
fn order_newest_first(filter: &mut Filter) -> Result<(), FilterError> {
    filter.order("date", SortDirection::Desc)?;
    filter.order("symbol", SortDirection::Asc)?;
    Ok(())
}

fn push_date_range(filter: &mut Filter, dates: DateRange) -> Result<(), FilterError> {
    if let Some(start) = dates.start {
        filter.where_clause().gte("date", "start_date", start)?;
    }
    if let Some(end) = dates.end {
        filter.where_clause().lte("date", "end_date", end)?;
    }
    Ok(())
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgPatternStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgPatternStore {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self { pool, query_timeout }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn select_all<T>(&self, filter: Filter) -> Result<Vec<T>, DatabaseError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        QueryBuilder::<T>::new(filter)
            .timeout(self.query_timeout)
            .select_all(&self.pool)
            .await
    }
}

#[async_trait]
impl PatternStore for PgPatternStore {
    async fn latest_patterns(&self, page: Page) -> Result<Vec<PatternRecord>, DatabaseError> {
        self.select_all(latest_filter(page)?).await
    }

    async fn search_patterns(
        &self,
        search: &PatternSearch,
        page: Page,
    ) -> Result<Vec<PatternRecord>, DatabaseError> {
        self.select_all(search_filter(search, page)?).await
    }

    async fn pattern_ranks(&self) -> Result<Vec<PatternRankLookup>, DatabaseError> {
        let ranks: Vec<PatternRankLookup> = self.select_all(rank_filter()?).await?;
        if let Some(bad) = ranks.iter().find(|r| !r.is_consistent()) {
            tracing::warn!(
                "pattern_rank_lookup row {} has pattern_value {} for bit {}",
                bad.pattern_name,
                bad.pattern_value,
                bad.bit_position
            );
        }
        Ok(ranks)
    }

    async fn stock_history(
        &self,
        table: &StockTable,
        dates: DateRange,
    ) -> Result<Vec<PatternRecord>, DatabaseError> {
        self.select_all(stock_filter(table, dates)?).await
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        tokio::time::timeout(self.query_timeout, manager::health_check(&self.pool))
            .await
            .map_err(|_| DatabaseError::Timeout(self.query_timeout))?
    }
}
