use chrono::NaiveDate;
use sqlx::{MySql, QueryBuilder};

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    U64(u64),
    Date(NaiveDate),
}

impl From<u64> for SqlValue {
    fn from(v: u64) -> Self {
        SqlValue::U64(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Gte,
    Lte,
}

impl Op {
    fn as_sql(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Gte => ">=",
            Op::Lte => "<=",
        }
    }
}

/// One `column op ?` predicate. Columns are static so only values are
/// ever supplied by the caller, and those always go through a bind.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: &'static str,
    pub op: Op,
    pub value: SqlValue,
}

/// ===============================
/// Composable AND-ed WHERE clause
/// ===============================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    conditions: Vec<Condition>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, column: &'static str, op: Op, value: impl Into<SqlValue>) -> Self {
        self.conditions.push(Condition {
            column,
            op,
            value: value.into(),
        });
        self
    }

    /// Adds the predicate only when a value is present.
    pub fn and_opt<T: Into<SqlValue>>(self, column: &'static str, op: Op, value: Option<T>) -> Self {
        match value {
            Some(v) => self.and(column, op, v),
            None => self,
        }
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Appends ` WHERE c1 AND c2 ...` with every value bound as a parameter.
    pub fn push_to(&self, qb: &mut QueryBuilder<'_, MySql>) {
        for (i, condition) in self.conditions.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            qb.push(condition.column);
            qb.push(" ");
            qb.push(condition.op.as_sql());
            qb.push(" ");

            match &condition.value {
                SqlValue::U64(v) => qb.push_bind(*v),
                SqlValue::Date(v) => qb.push_bind(*v),
            };
        }
    }
}

/// Duplicate-key failures only. SQLSTATE 23000 alone also covers foreign-key
/// and NOT NULL violations, so the driver's error kind decides.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
