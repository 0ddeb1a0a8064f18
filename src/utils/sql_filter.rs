use chrono::NaiveDate;
use sqlx::Sqlite;
use sqlx::query::QueryAs;
use sqlx::sqlite::SqliteArguments;

/// ===============================
/// SQL bindable filter value
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Date(NaiveDate),
}

/// ===============================
/// AND-joined WHERE clause builder
/// ===============================
#[derive(Debug, Default)]
pub struct SqlFilter {
    conditions: Vec<&'static str>,
    values: Vec<SqlValue>,
}

impl SqlFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition with exactly one `?` placeholder.
    pub fn push(&mut self, condition: &'static str, value: SqlValue) -> &mut Self {
        self.conditions.push(condition);
        self.values.push(value);
        self
    }

    pub fn push_opt<T, F>(&mut self, condition: &'static str, value: Option<T>, to_sql: F) -> &mut Self
    where
        F: FnOnce(T) -> SqlValue,
    {
        if let Some(v) = value {
            self.push(condition, to_sql(v));
        }
        self
    }

    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Bind every value in the order the conditions were pushed.
    pub fn bind_to<'q, O>(
        self,
        mut query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    ) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
        for value in self.values {
            query = match value {
                SqlValue::Text(v) => query.bind(v),
                SqlValue::Date(v) => query.bind(v),
            };
        }
        query
    }
}

/// Wrap a user-supplied fragment for a LIKE substring search.
pub fn like_pattern(fragment: &str) -> String {
    let escaped = fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
