use std::time::Duration;

use sqlx::{self, postgres::{PgArguments, PgRow}, FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::filter::{Filter, SqlParam};

/// Executes a rendered `Filter` and decodes the rows into `T`
pub struct QueryBuilder<T> {
    filter: Filter,
    timeout: Option<Duration>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            timeout: None,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Bounds the statement's execution time, connection checkout included
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub async fn select_all(self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let sql_result = self.filter.to_sql()?;
        tracing::debug!(
            table = self.filter.table_name(),
            params = sql_result.params.len(),
            "{}",
            sql_result.query
        );

        let mut q = sqlx::query_as::<_, T>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }

        let rows = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, q.fetch_all(pool))
                .await
                .map_err(|_| DatabaseError::Timeout(limit))??,
            None => q.fetch_all(pool).await?,
        };
        Ok(rows)
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q SqlParam,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        SqlParam::Int(i) => q.bind(*i),
        SqlParam::Text(s) => q.bind(s.as_str()),
        SqlParam::Date(d) => q.bind(*d),
    }
}
