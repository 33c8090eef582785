use actix_web::error::ErrorBadRequest;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    DateTime(DateTime<Utc>),
    Null,
}

/// Binds every value, in order, onto a `query`, `query_as` or `query_scalar`.
#[macro_export]
macro_rules! bind_all {
    ($query:expr, $values:expr) => {{
        let mut query = $query;
        for value in $values {
            query = match value {
                $crate::utils::db_utils::SqlValue::String(v) => query.bind(v),
                $crate::utils::db_utils::SqlValue::DateTime(v) => query.bind(v),
                $crate::utils::db_utils::SqlValue::Null => query.bind(None::<String>),
            };
        }
        query
    }};
}

/// ===============================
/// WHERE clause builder
/// ===============================
#[derive(Debug, Default)]
pub struct Filter {
    conditions: Vec<&'static str>,
    pub values: Vec<SqlValue>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a condition with exactly one `?` placeholder.
    pub fn push(&mut self, condition: &'static str, value: SqlValue) -> &mut Self {
        self.conditions.push(condition);
        self.values.push(value);
        self
    }

    /// Adds a condition whose placeholders take `values` in order.
    pub fn push_all(
        &mut self,
        condition: &'static str,
        values: impl IntoIterator<Item = SqlValue>,
    ) -> &mut Self {
        self.conditions.push(condition);
        self.values.extend(values);
        self
    }

    /// `" WHERE a AND b"`, or an empty string without conditions.
    pub fn where_sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
/// Column names come from typed request structs, never from client keys.
pub fn build_update_sql(
    table: &str,
    sets: Vec<(&'static str, SqlValue)>,
    id_column: &str,
    id_value: SqlValue,
) -> Result<SqlUpdate, actix_web::Error> {
    if sets.is_empty() {
        return Err(ErrorBadRequest("No fields provided for update"));
    }

    let set_clause = sets
        .iter()
        .map(|(column, _)| format!("{} = ?", column))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        table, set_clause, id_column
    );

    let mut values: Vec<SqlValue> = sets.into_iter().map(|(_, value)| value).collect();
    values.push(id_value);

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let query = crate::bind_all!(sqlx::query(&update.sql), update.values);
    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_sql_lists_columns_in_order_with_id_last() {
        let update = build_update_sql(
            "users",
            vec![
                ("name", SqlValue::String("Dewi".into())),
                ("department", SqlValue::Null),
            ],
            "id",
            SqlValue::String("u-1".into()),
        )
        .unwrap();

        assert_eq!(update.sql, "UPDATE users SET name = ?, department = ? WHERE id = ?");
        assert_eq!(
            update.values,
            vec![
                SqlValue::String("Dewi".into()),
                SqlValue::Null,
                SqlValue::String("u-1".into()),
            ]
        );
    }

    #[test]
    fn empty_update_is_rejected() {
        assert!(build_update_sql("users", vec![], "id", SqlValue::String("u-1".into())).is_err());
    }

    #[test]
    fn filter_joins_conditions() {
        let since = DateTime::parse_from_rfc3339("2026-03-09T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut filter = Filter::new();
        assert_eq!(filter.where_sql(), "");

        filter
            .push("a.user_id = ?", SqlValue::String("u-1".into()))
            .push("a.work_date >= ?", SqlValue::DateTime(since));
        assert_eq!(filter.where_sql(), " WHERE a.user_id = ? AND a.work_date >= ?");
        assert_eq!(filter.values[1], SqlValue::DateTime(since));
    }

    #[test]
    fn grouped_condition_keeps_all_values() {
        let mut filter = Filter::new();
        filter
            .push("role = ?", SqlValue::String("employee".into()))
            .push_all(
                "(name LIKE ? OR email LIKE ?)",
                [SqlValue::String("%ra%".into()), SqlValue::String("%ra%".into())],
            );

        assert_eq!(filter.where_sql(), " WHERE role = ? AND (name LIKE ? OR email LIKE ?)");
        assert_eq!(filter.values.len(), 3);
    }
}
