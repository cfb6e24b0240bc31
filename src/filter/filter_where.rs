use super::error::FilterError;
use super::types::{FilterOp, FilterWhereInfo, SqlParam};

/// Conjunctive WHERE builder.
///
/// Operands are registered under placeholder names and rendered as
/// positional `$n` parameters. A name used more than once maps to the same
/// slot, so `(pattern_value & :mask) = :mask` binds a single value.
#[derive(Debug, Clone, Default)]
pub struct FilterWhere {
    conditions: Vec<FilterWhereInfo>,
}

struct Params {
    names: Vec<String>,
    values: Vec<SqlParam>,
}

impl Params {
    fn slot(&mut self, name: &str, value: &SqlParam) -> Result<String, FilterError> {
        if let Some(idx) = self.names.iter().position(|n| n == name) {
            if &self.values[idx] != value {
                return Err(FilterError::InvalidOperatorData(format!(
                    "placeholder :{} bound to conflicting values",
                    name
                )));
            }
            return Ok(format!("${}", idx + 1));
        }
        self.names.push(name.to_string());
        self.values.push(value.clone());
        Ok(format!("${}", self.values.len()))
    }
}

impl FilterWhere {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a predicate without an operand (e.g. `IS NOT NULL`)
    pub fn is_not_null(&mut self, column: &str) -> Result<&mut Self, FilterError> {
        self.push(column, FilterOp::NotNull, None)
    }

    pub fn eq(
        &mut self,
        column: &str,
        name: &str,
        value: impl Into<SqlParam>,
    ) -> Result<&mut Self, FilterError> {
        self.push(column, FilterOp::Eq, Some((name.to_string(), value.into())))
    }

    pub fn gte(
        &mut self,
        column: &str,
        name: &str,
        value: impl Into<SqlParam>,
    ) -> Result<&mut Self, FilterError> {
        self.push(column, FilterOp::Gte, Some((name.to_string(), value.into())))
    }

    pub fn lte(
        &mut self,
        column: &str,
        name: &str,
        value: impl Into<SqlParam>,
    ) -> Result<&mut Self, FilterError> {
        self.push(column, FilterOp::Lte, Some((name.to_string(), value.into())))
    }

    pub fn bits_all(
        &mut self,
        column: &str,
        name: &str,
        mask: i64,
    ) -> Result<&mut Self, FilterError> {
        self.push(column, FilterOp::BitsAll, Some((name.to_string(), SqlParam::Int(mask))))
    }

    pub fn push(
        &mut self,
        column: &str,
        operator: FilterOp,
        param: Option<(String, SqlParam)>,
    ) -> Result<&mut Self, FilterError> {
        validate_identifier(column).map_err(FilterError::InvalidColumn)?;
        match (&operator, &param) {
            (FilterOp::NotNull, Some(_)) => {
                return Err(FilterError::InvalidOperatorData(
                    "IS NOT NULL takes no operand".to_string(),
                ))
            }
            (FilterOp::NotNull, None) => {}
            (_, None) => {
                return Err(FilterError::InvalidOperatorData(format!(
                    "{:?} requires an operand",
                    operator
                )))
            }
            (_, Some((name, _))) => {
                validate_identifier(name).map_err(FilterError::InvalidOperatorData)?
            }
        }
        self.conditions.push(FilterWhereInfo {
            column: column.to_string(),
            operator,
            param,
        });
        Ok(self)
    }

    /// Renders the predicate list. An empty builder renders `TRUE`.
    pub fn generate(&self) -> Result<(String, Vec<SqlParam>), FilterError> {
        let mut params = Params { names: vec![], values: vec![] };
        let mut sql_conditions = Vec::with_capacity(self.conditions.len());

        for condition in &self.conditions {
            let col = format!("\"{}\"", condition.column);
            let sql = match (condition.operator, &condition.param) {
                (FilterOp::NotNull, _) => format!("{} IS NOT NULL", col),
                (FilterOp::Eq, Some((name, value))) => {
                    format!("{} = {}", col, params.slot(name, value)?)
                }
                (FilterOp::Gte, Some((name, value))) => {
                    format!("{} >= {}", col, params.slot(name, value)?)
                }
                (FilterOp::Lte, Some((name, value))) => {
                    format!("{} <= {}", col, params.slot(name, value)?)
                }
                (FilterOp::BitsAll, Some((name, value))) => {
                    let slot = params.slot(name, value)?;
                    format!("({} & {}) = {}", col, slot, slot)
                }
                (op, None) => {
                    return Err(FilterError::InvalidOperatorData(format!(
                        "{:?} requires an operand",
                        op
                    )))
                }
            };
            sql_conditions.push(sql);
        }

        let where_clause = if sql_conditions.is_empty() {
            "TRUE".to_string()
        } else {
            sql_conditions.join(" AND ")
        };
        Ok((where_clause, params.values))
    }
}

/// Accepts `[A-Za-z_][A-Za-z0-9_]*`
pub(crate) fn validate_identifier(name: &str) -> Result<(), String> {
    let mut chars = name.chars();
    match chars.next() {
        None => Err("identifier cannot be empty".to_string()),
        Some(first) if !(first.is_ascii_alphabetic() || first == '_') => {
            Err(format!("invalid identifier format: {}", name))
        }
        Some(_) if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') => {
            Err(format!("invalid identifier format: {}", name))
        }
        Some(_) => Ok(()),
    }
}
