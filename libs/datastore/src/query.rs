//! Structured filter/sort/aggregate composition, rendered to SQL with
//! positional binds. Column names are validated against the target table's
//! whitelist before any statement is built; values always travel as binds.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value as Json;
use uuid::Uuid;

use crate::errors::{StoreError, StoreResult};

/// A single bindable value. Covers every column type in the schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    TextArray(Vec<String>),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
    Json(Json),
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(v as i64)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}

impl From<Vec<String>> for Scalar {
    fn from(v: Vec<String>) -> Self {
        Scalar::TextArray(v)
    }
}

impl From<Uuid> for Scalar {
    fn from(v: Uuid) -> Self {
        Scalar::Uuid(v)
    }
}

impl From<DateTime<Utc>> for Scalar {
    fn from(v: DateTime<Utc>) -> Self {
        Scalar::DateTime(v)
    }
}

impl From<Json> for Scalar {
    fn from(v: Json) -> Self {
        Scalar::Json(v)
    }
}

/// A composable filter tree. Mirrors the relational operators PostgreSQL
/// offers; translation to SQL is purely mechanical.
#[derive(Debug, Clone)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Eq(String, Scalar),
    Ne(String, Scalar),
    Lt(String, Scalar),
    Lte(String, Scalar),
    Gt(String, Scalar),
    Gte(String, Scalar),
    /// Scalar column value is one of the listed values.
    In(String, Vec<Scalar>),
    /// Case-insensitive substring match on a text column.
    Contains(String, String),
    StartsWith(String, String),
    EndsWith(String, String),
    /// A TEXT[] column contains the given element.
    Has(String, String),
    IsNull(String),
    IsNotNull(String),
    /// Text comparison at a path inside a JSONB column.
    JsonEq {
        column: String,
        path: Vec<String>,
        value: String,
    },
}

impl Filter {
    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And(filters)
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: Filter) -> Self {
        Filter::Not(Box::new(filter))
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Filter::Eq(column.into(), value.into())
    }

    pub fn ne(column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Filter::Ne(column.into(), value.into())
    }

    pub fn lt(column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Filter::Lt(column.into(), value.into())
    }

    pub fn lte(column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Filter::Lte(column.into(), value.into())
    }

    pub fn gt(column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Filter::Gt(column.into(), value.into())
    }

    pub fn gte(column: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Filter::Gte(column.into(), value.into())
    }

    pub fn is_in<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        Filter::In(column.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn contains(column: impl Into<String>, needle: impl Into<String>) -> Self {
        Filter::Contains(column.into(), needle.into())
    }

    pub fn starts_with(column: impl Into<String>, prefix: impl Into<String>) -> Self {
        Filter::StartsWith(column.into(), prefix.into())
    }

    pub fn ends_with(column: impl Into<String>, suffix: impl Into<String>) -> Self {
        Filter::EndsWith(column.into(), suffix.into())
    }

    pub fn has(column: impl Into<String>, element: impl Into<String>) -> Self {
        Filter::Has(column.into(), element.into())
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Filter::IsNull(column.into())
    }

    pub fn is_not_null(column: impl Into<String>) -> Self {
        Filter::IsNotNull(column.into())
    }

    pub fn json_eq(
        column: impl Into<String>,
        path: impl IntoIterator<Item = impl Into<String>>,
        value: impl Into<String>,
    ) -> Self {
        Filter::JsonEq {
            column: column.into(),
            path: path.into_iter().map(Into::into).collect(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sort {
    pub column: String,
    pub direction: Direction,
}

/// Parameters for a `find_many` call: optional filter, sorting, pagination.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub filter: Option<Filter>,
    pub order_by: Vec<Sort>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order_by.push(Sort {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Which aggregate functions to compute. `min`/`max`/`avg`/`sum` columns
/// must be numeric; results come back as `double precision`.
#[derive(Debug, Clone, Default)]
pub struct AggregateSpec {
    pub count: bool,
    pub min: Vec<String>,
    pub max: Vec<String>,
    pub avg: Vec<String>,
    pub sum: Vec<String>,
}

impl AggregateSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_count(mut self) -> Self {
        self.count = true;
        self
    }

    pub fn with_min(mut self, column: impl Into<String>) -> Self {
        self.min.push(column.into());
        self
    }

    pub fn with_max(mut self, column: impl Into<String>) -> Self {
        self.max.push(column.into());
        self
    }

    pub fn with_avg(mut self, column: impl Into<String>) -> Self {
        self.avg.push(column.into());
        self
    }

    pub fn with_sum(mut self, column: impl Into<String>) -> Self {
        self.sum.push(column.into());
        self
    }

    fn is_empty(&self) -> bool {
        !self.count
            && self.min.is_empty()
            && self.max.is_empty()
            && self.avg.is_empty()
            && self.sum.is_empty()
    }
}

/// Aggregate results. `values` is keyed `"<fn>_<column>"`, e.g. `"avg_level"`.
#[derive(Debug, Clone, Default)]
pub struct AggregateResult {
    pub count: Option<i64>,
    pub values: BTreeMap<String, Option<f64>>,
}

impl AggregateResult {
    /// Looks up a computed value by its `"<fn>_<column>"` key. `None` both
    /// when the key was never requested and when the aggregate was NULL
    /// (no matching rows).
    pub fn value(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied().flatten()
    }
}

/// One group from a `group_by` call. The key is the grouping column cast to
/// text; NULL group keys stay `None`.
#[derive(Debug, Clone)]
pub struct GroupByRow {
    pub key: Option<String>,
    pub count: Option<i64>,
    pub values: BTreeMap<String, Option<f64>>,
}

fn check_column(column: &str, allowed: &[&str]) -> StoreResult<()> {
    if allowed.contains(&column) {
        Ok(())
    } else {
        Err(StoreError::Validation(format!(
            "unknown column '{column}'"
        )))
    }
}

/// Escapes LIKE metacharacters so user input matches literally.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn cmp(
    column: &str,
    op: &str,
    value: &Scalar,
    allowed: &[&str],
    binds: &mut Vec<Scalar>,
) -> StoreResult<String> {
    check_column(column, allowed)?;
    binds.push(value.clone());
    Ok(format!("{column} {op} ${}", binds.len()))
}

fn like(
    column: &str,
    pattern: String,
    allowed: &[&str],
    binds: &mut Vec<Scalar>,
) -> StoreResult<String> {
    check_column(column, allowed)?;
    binds.push(Scalar::Text(pattern));
    Ok(format!("{column} ILIKE ${}", binds.len()))
}

/// Renders a filter tree into a WHERE-clause fragment, appending binds in
/// placeholder order.
pub(crate) fn render_filter(
    filter: &Filter,
    allowed: &[&str],
    binds: &mut Vec<Scalar>,
) -> StoreResult<String> {
    match filter {
        Filter::And(parts) | Filter::Or(parts) => {
            if parts.is_empty() {
                return Err(StoreError::Validation(
                    "empty AND/OR filter branch".to_string(),
                ));
            }
            let joiner = match filter {
                Filter::And(_) => " AND ",
                _ => " OR ",
            };
            let rendered: Vec<String> = parts
                .iter()
                .map(|p| render_filter(p, allowed, binds))
                .collect::<StoreResult<_>>()?;
            Ok(format!("({})", rendered.join(joiner)))
        }
        Filter::Not(inner) => {
            let rendered = render_filter(inner, allowed, binds)?;
            Ok(format!("NOT ({rendered})"))
        }
        Filter::Eq(c, v) => cmp(c, "=", v, allowed, binds),
        Filter::Ne(c, v) => cmp(c, "<>", v, allowed, binds),
        Filter::Lt(c, v) => cmp(c, "<", v, allowed, binds),
        Filter::Lte(c, v) => cmp(c, "<=", v, allowed, binds),
        Filter::Gt(c, v) => cmp(c, ">", v, allowed, binds),
        Filter::Gte(c, v) => cmp(c, ">=", v, allowed, binds),
        Filter::In(c, values) => {
            check_column(c, allowed)?;
            if values.is_empty() {
                return Err(StoreError::Validation(format!(
                    "empty IN list for column '{c}'"
                )));
            }
            let placeholders: Vec<String> = values
                .iter()
                .map(|v| {
                    binds.push(v.clone());
                    format!("${}", binds.len())
                })
                .collect();
            Ok(format!("{c} IN ({})", placeholders.join(", ")))
        }
        Filter::Contains(c, needle) => {
            like(c, format!("%{}%", escape_like(needle)), allowed, binds)
        }
        Filter::StartsWith(c, prefix) => {
            like(c, format!("{}%", escape_like(prefix)), allowed, binds)
        }
        Filter::EndsWith(c, suffix) => {
            like(c, format!("%{}", escape_like(suffix)), allowed, binds)
        }
        Filter::Has(c, element) => {
            check_column(c, allowed)?;
            binds.push(Scalar::Text(element.clone()));
            Ok(format!("${} = ANY({c})", binds.len()))
        }
        Filter::IsNull(c) => {
            check_column(c, allowed)?;
            Ok(format!("{c} IS NULL"))
        }
        Filter::IsNotNull(c) => {
            check_column(c, allowed)?;
            Ok(format!("{c} IS NOT NULL"))
        }
        Filter::JsonEq {
            column,
            path,
            value,
        } => {
            check_column(column, allowed)?;
            if path.is_empty() {
                return Err(StoreError::Validation(format!(
                    "empty JSON path for column '{column}'"
                )));
            }
            binds.push(Scalar::TextArray(path.clone()));
            let path_idx = binds.len();
            binds.push(Scalar::Text(value.clone()));
            Ok(format!("{column} #>> ${path_idx} = ${}", binds.len()))
        }
    }
}

fn render_where(
    filter: Option<&Filter>,
    allowed: &[&str],
    binds: &mut Vec<Scalar>,
) -> StoreResult<String> {
    match filter {
        Some(f) => Ok(format!(" WHERE {}", render_filter(f, allowed, binds)?)),
        None => Ok(String::new()),
    }
}

/// Builds a `SELECT *` statement for `find_many`.
pub(crate) fn build_select(
    table: &str,
    allowed: &[&str],
    query: &ListQuery,
) -> StoreResult<(String, Vec<Scalar>)> {
    let mut binds = Vec::new();
    let mut sql = format!("SELECT * FROM {table}");
    sql.push_str(&render_where(query.filter.as_ref(), allowed, &mut binds)?);

    if !query.order_by.is_empty() {
        let mut parts = Vec::with_capacity(query.order_by.len());
        for sort in &query.order_by {
            check_column(&sort.column, allowed)?;
            parts.push(format!("{} {}", sort.column, sort.direction.as_sql()));
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(&parts.join(", "));
    }

    if let Some(limit) = query.limit {
        if limit < 0 {
            return Err(StoreError::Validation("negative limit".to_string()));
        }
        binds.push(Scalar::Int(limit));
        sql.push_str(&format!(" LIMIT ${}", binds.len()));
    }
    if let Some(offset) = query.offset {
        if offset < 0 {
            return Err(StoreError::Validation("negative offset".to_string()));
        }
        binds.push(Scalar::Int(offset));
        sql.push_str(&format!(" OFFSET ${}", binds.len()));
    }

    Ok((sql, binds))
}

pub(crate) fn build_count(
    table: &str,
    allowed: &[&str],
    filter: Option<&Filter>,
) -> StoreResult<(String, Vec<Scalar>)> {
    let mut binds = Vec::new();
    let sql = format!(
        "SELECT COUNT(*) FROM {table}{}",
        render_where(filter, allowed, &mut binds)?
    );
    Ok((sql, binds))
}

pub(crate) fn build_delete_many(
    table: &str,
    allowed: &[&str],
    filter: Option<&Filter>,
) -> StoreResult<(String, Vec<Scalar>)> {
    let mut binds = Vec::new();
    let sql = format!(
        "DELETE FROM {table}{}",
        render_where(filter, allowed, &mut binds)?
    );
    Ok((sql, binds))
}

/// Renders the aggregate select list, e.g.
/// `COUNT(*) AS agg_count, AVG(level)::float8 AS avg_level`.
fn render_aggregate_exprs(spec: &AggregateSpec, allowed: &[&str]) -> StoreResult<String> {
    if spec.is_empty() {
        return Err(StoreError::Validation(
            "aggregate spec selects nothing".to_string(),
        ));
    }
    let mut exprs = Vec::new();
    if spec.count {
        exprs.push("COUNT(*) AS agg_count".to_string());
    }
    for (func, columns) in [
        ("min", &spec.min),
        ("max", &spec.max),
        ("avg", &spec.avg),
        ("sum", &spec.sum),
    ] {
        for column in columns {
            check_column(column, allowed)?;
            exprs.push(format!(
                "{}({column})::float8 AS {func}_{column}",
                func.to_uppercase()
            ));
        }
    }
    Ok(exprs.join(", "))
}

/// Keys under which aggregate values will be found in the result row.
pub(crate) fn aggregate_keys(spec: &AggregateSpec) -> Vec<String> {
    let mut keys = Vec::new();
    for (func, columns) in [
        ("min", &spec.min),
        ("max", &spec.max),
        ("avg", &spec.avg),
        ("sum", &spec.sum),
    ] {
        for column in columns {
            keys.push(format!("{func}_{column}"));
        }
    }
    keys
}

pub(crate) fn build_aggregate(
    table: &str,
    allowed: &[&str],
    filter: Option<&Filter>,
    spec: &AggregateSpec,
) -> StoreResult<(String, Vec<Scalar>)> {
    let exprs = render_aggregate_exprs(spec, allowed)?;
    let mut binds = Vec::new();
    let sql = format!(
        "SELECT {exprs} FROM {table}{}",
        render_where(filter, allowed, &mut binds)?
    );
    Ok((sql, binds))
}

pub(crate) fn build_group_by(
    table: &str,
    allowed: &[&str],
    by: &str,
    filter: Option<&Filter>,
    spec: &AggregateSpec,
) -> StoreResult<(String, Vec<Scalar>)> {
    check_column(by, allowed)?;
    let exprs = render_aggregate_exprs(spec, allowed)?;
    let mut binds = Vec::new();
    let sql = format!(
        "SELECT {by}::text AS group_key, {exprs} FROM {table}{} GROUP BY {by} ORDER BY group_key",
        render_where(filter, allowed, &mut binds)?
    );
    Ok((sql, binds))
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLS: &[&str] = &["id", "email", "name", "level", "tags", "payload"];

    fn render(filter: &Filter) -> StoreResult<(String, Vec<Scalar>)> {
        let mut binds = Vec::new();
        let sql = render_filter(filter, COLS, &mut binds)?;
        Ok((sql, binds))
    }

    #[test]
    fn test_eq_renders_bind() {
        let (sql, binds) = render(&Filter::eq("email", "a@b.com")).unwrap();
        assert_eq!(sql, "email = $1");
        assert_eq!(binds, vec![Scalar::Text("a@b.com".to_string())]);
    }

    #[test]
    fn test_comparison_operators() {
        let (sql, _) = render(&Filter::ne("level", 3)).unwrap();
        assert_eq!(sql, "level <> $1");
        let (sql, _) = render(&Filter::lt("level", 3)).unwrap();
        assert_eq!(sql, "level < $1");
        let (sql, _) = render(&Filter::lte("level", 3)).unwrap();
        assert_eq!(sql, "level <= $1");
        let (sql, _) = render(&Filter::gt("level", 3)).unwrap();
        assert_eq!(sql, "level > $1");
        let (sql, _) = render(&Filter::gte("level", 3)).unwrap();
        assert_eq!(sql, "level >= $1");
    }

    #[test]
    fn test_unknown_column_rejected_before_sql() {
        let err = render(&Filter::eq("password", "x")).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn test_and_or_composition_numbers_binds_in_order() {
        let filter = Filter::and(vec![
            Filter::eq("name", "rust"),
            Filter::or(vec![Filter::gte("level", 3), Filter::eq("email", "a@b")]),
        ]);
        let (sql, binds) = render(&filter).unwrap();
        assert_eq!(sql, "(name = $1 AND (level >= $2 OR email = $3))");
        assert_eq!(binds.len(), 3);
    }

    #[test]
    fn test_not_wraps_inner() {
        let (sql, _) = render(&Filter::not(Filter::eq("name", "rust"))).unwrap();
        assert_eq!(sql, "NOT (name = $1)");
    }

    #[test]
    fn test_empty_and_is_validation_error() {
        assert!(matches!(
            render(&Filter::and(vec![])),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_in_list() {
        let (sql, binds) = render(&Filter::is_in("name", ["a", "b", "c"])).unwrap();
        assert_eq!(sql, "name IN ($1, $2, $3)");
        assert_eq!(binds.len(), 3);
    }

    #[test]
    fn test_empty_in_list_rejected() {
        let empty: Vec<String> = vec![];
        assert!(matches!(
            render(&Filter::is_in("name", empty)),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_contains_escapes_like_metacharacters() {
        let (sql, binds) = render(&Filter::contains("name", "50%_done")).unwrap();
        assert_eq!(sql, "name ILIKE $1");
        assert_eq!(binds, vec![Scalar::Text("%50\\%\\_done%".to_string())]);
    }

    #[test]
    fn test_starts_and_ends_with() {
        let (_, binds) = render(&Filter::starts_with("name", "ru")).unwrap();
        assert_eq!(binds, vec![Scalar::Text("ru%".to_string())]);
        let (_, binds) = render(&Filter::ends_with("name", "st")).unwrap();
        assert_eq!(binds, vec![Scalar::Text("%st".to_string())]);
    }

    #[test]
    fn test_has_uses_any() {
        let (sql, _) = render(&Filter::has("tags", "rust")).unwrap();
        assert_eq!(sql, "$1 = ANY(tags)");
    }

    #[test]
    fn test_null_checks() {
        let (sql, binds) = render(&Filter::is_null("name")).unwrap();
        assert_eq!(sql, "name IS NULL");
        assert!(binds.is_empty());
        let (sql, _) = render(&Filter::is_not_null("name")).unwrap();
        assert_eq!(sql, "name IS NOT NULL");
    }

    #[test]
    fn test_json_path_binds_path_and_value() {
        let (sql, binds) =
            render(&Filter::json_eq("payload", ["scores", "openness"], "high")).unwrap();
        assert_eq!(sql, "payload #>> $1 = $2");
        assert_eq!(
            binds[0],
            Scalar::TextArray(vec!["scores".to_string(), "openness".to_string()])
        );
        assert_eq!(binds[1], Scalar::Text("high".to_string()));
    }

    #[test]
    fn test_json_empty_path_rejected() {
        let empty: Vec<String> = vec![];
        assert!(matches!(
            render(&Filter::json_eq("payload", empty, "x")),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_build_select_plain() {
        let (sql, binds) = build_select("skills", COLS, &ListQuery::new()).unwrap();
        assert_eq!(sql, "SELECT * FROM skills");
        assert!(binds.is_empty());
    }

    #[test]
    fn test_build_select_full() {
        let query = ListQuery::new()
            .filter(Filter::gte("level", 3))
            .order_by("level", Direction::Desc)
            .order_by("name", Direction::Asc)
            .limit(10)
            .offset(20);
        let (sql, binds) = build_select("skills", COLS, &query).unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM skills WHERE level >= $1 \
             ORDER BY level DESC, name ASC LIMIT $2 OFFSET $3"
        );
        assert_eq!(binds.len(), 3);
        assert_eq!(binds[1], Scalar::Int(10));
        assert_eq!(binds[2], Scalar::Int(20));
    }

    #[test]
    fn test_build_select_rejects_bad_sort_column() {
        let query = ListQuery::new().order_by("nope", Direction::Asc);
        assert!(matches!(
            build_select("skills", COLS, &query),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_build_select_rejects_negative_pagination() {
        assert!(build_select("skills", COLS, &ListQuery::new().limit(-1)).is_err());
        assert!(build_select("skills", COLS, &ListQuery::new().offset(-5)).is_err());
    }

    #[test]
    fn test_build_count_and_delete_many() {
        let filter = Filter::eq("name", "rust");
        let (sql, _) = build_count("skills", COLS, Some(&filter)).unwrap();
        assert_eq!(sql, "SELECT COUNT(*) FROM skills WHERE name = $1");
        let (sql, _) = build_delete_many("skills", COLS, Some(&filter)).unwrap();
        assert_eq!(sql, "DELETE FROM skills WHERE name = $1");
        let (sql, _) = build_delete_many("skills", COLS, None).unwrap();
        assert_eq!(sql, "DELETE FROM skills");
    }

    #[test]
    fn test_build_aggregate() {
        let spec = AggregateSpec::new()
            .with_count()
            .with_avg("level")
            .with_max("level");
        let (sql, _) = build_aggregate("skills", COLS, None, &spec).unwrap();
        assert_eq!(
            sql,
            "SELECT COUNT(*) AS agg_count, MAX(level)::float8 AS max_level, \
             AVG(level)::float8 AS avg_level FROM skills"
        );
    }

    #[test]
    fn test_empty_aggregate_spec_rejected() {
        assert!(matches!(
            build_aggregate("skills", COLS, None, &AggregateSpec::new()),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_aggregate_rejects_unknown_column() {
        let spec = AggregateSpec::new().with_sum("salary");
        assert!(build_aggregate("skills", COLS, None, &spec).is_err());
    }

    #[test]
    fn test_build_group_by() {
        let spec = AggregateSpec::new().with_count().with_avg("level");
        let (sql, _) =
            build_group_by("skills", COLS, "name", Some(&Filter::gt("level", 1)), &spec).unwrap();
        assert_eq!(
            sql,
            "SELECT name::text AS group_key, COUNT(*) AS agg_count, \
             AVG(level)::float8 AS avg_level FROM skills WHERE level > $1 \
             GROUP BY name ORDER BY group_key"
        );
    }

    #[test]
    fn test_group_by_rejects_unknown_key() {
        let spec = AggregateSpec::new().with_count();
        assert!(build_group_by("skills", COLS, "nope", None, &spec).is_err());
    }

    #[test]
    fn test_aggregate_keys_order_matches_exprs() {
        let spec = AggregateSpec::new().with_min("level").with_sum("level");
        assert_eq!(
            aggregate_keys(&spec),
            vec!["min_level".to_string(), "sum_level".to_string()]
        );
    }

    #[test]
    fn test_aggregate_result_lookup() {
        let mut result = AggregateResult::default();
        result.values.insert("avg_level".to_string(), Some(3.5));
        result.values.insert("min_level".to_string(), None);
        assert_eq!(result.value("avg_level"), Some(3.5));
        assert_eq!(result.value("min_level"), None);
        assert_eq!(result.value("never_asked"), None);
    }
}
