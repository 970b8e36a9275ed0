//! Federated query pushdown
//!
//! A federated table is served by a remote provider that cannot join
//! against tables of the native engine. Queries joining it with native
//! (dimension) tables are split in two steps:
//!
//! 1. For each dimension, a `SELECT DISTINCT` query run on the native engine
//!    fetches the key values that survive the dimension's filters.
//! 2. The federated provider receives a subquery over the federated table
//!    alone, with an `IN` list per dimension bound from those values.
//!
//! Two entry points share these concepts:
//! - [`FederatedQueryAnalyzer`] runs detection, join recognition and split
//!   construction, producing a [`FederatedQueryAnalysis`].
//! - [`extract_pushdown_info`] is a single pass that only classifies which
//!   joins could be pushed, producing an [`AqferPushdownInfo`].
//!
//! Joins that cannot be interpreted are left out. They are never an error.

pub mod analyzer;
pub mod pushdown;

use serde::{Deserialize, Serialize};

use crate::expressions::{BinaryOperator, ColumnReference, Expression, Literal, SelectStatement, TableReference};

pub use analyzer::{FederatedQueryAnalysis, FederatedQueryAnalyzer};
pub use pushdown::{extract_pushdown_info, AqferPushdownInfo, JoinColumnPair, PushableJoin};

/// The federated table found in a query's FROM list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FederatedTableReference {
    pub table_name: String,
    /// Dataset name with the federated suffix removed
    pub dataset_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub dimension_joins: Vec<DimensionJoin>,
    /// Index in the FROM list
    pub position: usize,
}

impl FederatedTableReference {
    pub fn new(table: &TableReference, dataset_type: impl Into<String>, position: usize) -> Self {
        Self {
            table_name: table.name.clone(),
            dataset_type: dataset_type.into(),
            alias: table.alias.clone(),
            dimension_joins: Vec::new(),
            position,
        }
    }

    /// Whether a column is qualified with the federated table
    pub fn owns_column(&self, column: &ColumnReference) -> bool {
        let Some(qualifier) = column.table.as_deref() else {
            return false;
        };
        if self
            .alias
            .as_deref()
            .is_some_and(|alias| alias.eq_ignore_ascii_case(qualifier))
        {
            return true;
        }
        let short = self.table_name.rsplit('.').next().unwrap_or(&self.table_name);
        self.table_name.eq_ignore_ascii_case(qualifier) || short.eq_ignore_ascii_case(qualifier)
    }
}

/// A join between the federated table and a dimension table.
///
/// `join_column` is the federated side of the equality and `table_column`
/// the dimension side. The `filter_*` fields hold the first WHERE filter on
/// the dimension, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionJoin {
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub join_column: String,
    pub table_column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_operator: Option<BinaryOperator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_value: Option<Literal>,
    /// The filtered column is also projected or grouped on, so its values
    /// must flow back into the federated subquery
    #[serde(default)]
    pub requires_callback: bool,
}

/// One `<column> <operator> <value>` filter on a dimension table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub column: String,
    pub operator: BinaryOperator,
    pub value: Literal,
}

impl std::fmt::Display for FilterCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.column, self.operator, self.value)
    }
}

/// Values to pre-fetch from one dimension table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionFilter {
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Federated column the fetched values are bound to
    pub federated_column: String,
    #[serde(default)]
    pub conditions: Vec<FilterCondition>,
    /// `SELECT DISTINCT <federated_column> FROM <table_name> [WHERE ...]`
    pub value_fetch_sql: String,
}

/// Copy of `expr` with every column qualifier removed
pub fn strip_qualifiers(expr: &Expression) -> Expression {
    match expr {
        Expression::BinaryExpression(b) => Expression::binary(
            strip_qualifiers(&b.left),
            b.operator,
            strip_qualifiers(&b.right),
        ),
        Expression::ColumnReference(c) => Expression::ColumnReference(c.unqualified()),
        Expression::Literal(l) => Expression::Literal(l.clone()),
        Expression::FunctionCall(f) => {
            let mut call = f.as_ref().clone();
            call.args = f.args.iter().map(strip_qualifiers).collect();
            Expression::FunctionCall(Box::new(call))
        }
        Expression::InExpression(in_expr) => Expression::in_list(
            in_expr.column.unqualified(),
            in_expr.values.iter().map(strip_qualifiers).collect(),
        ),
        Expression::Star => Expression::Star,
    }
}

/// Whether the statement projects or groups on `column` of `table`, either
/// qualified with the table or unqualified.
pub(crate) fn is_projected(statement: &SelectStatement, table: &TableReference, column: &str) -> bool {
    statement
        .select_list
        .iter()
        .chain(statement.group_by.iter())
        .flat_map(crate::traversal::columns)
        .any(|c| {
            c.column.eq_ignore_ascii_case(column)
                && c.table.as_deref().map_or(true, |q| table.matches_qualifier(q))
        })
}

/// The two sides of `fed_col = dim_col`, federated side first, in either
/// written order. `None` unless one side belongs to the federated table and
/// the other to `dimension`.
pub(crate) fn join_columns<'a>(
    expr: &'a Expression,
    federated: &FederatedTableReference,
    dimension: &TableReference,
) -> Option<(&'a ColumnReference, &'a ColumnReference)> {
    let binary = expr.as_binary()?;
    if binary.operator != BinaryOperator::Eq {
        return None;
    }
    let left = binary.left.as_column()?;
    let right = binary.right.as_column()?;
    if federated.owns_column(left) && dimension.owns_column(right) {
        Some((left, right))
    } else if federated.owns_column(right) && dimension.owns_column(left) {
        Some((right, left))
    } else {
        None
    }
}

/// Like [`join_columns`], but an unqualified side also counts as the
/// dimension's when the other side belongs to the federated table.
pub(crate) fn dimension_join_columns<'a>(
    expr: &'a Expression,
    federated: &FederatedTableReference,
    dimension: &TableReference,
) -> Option<(&'a ColumnReference, &'a ColumnReference)> {
    if let Some(pair) = join_columns(expr, federated, dimension) {
        return Some(pair);
    }
    let binary = expr.as_binary()?;
    if binary.operator != BinaryOperator::Eq {
        return None;
    }
    let left = binary.left.as_column()?;
    let right = binary.right.as_column()?;
    if federated.owns_column(left) && right.table.is_none() {
        Some((left, right))
    } else if federated.owns_column(right) && left.table.is_none() {
        Some((right, left))
    } else {
        None
    }
}

/// Whether any column of `expr` is qualified with `table`
pub(crate) fn references_table(expr: &Expression, table: &TableReference) -> bool {
    crate::traversal::columns(expr).iter().any(|c| table.owns_column(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::*;

    #[test]
    fn test_owns_column_by_alias_or_name() {
        let table = TableReference::new("events_aqfer.impressions").with_alias("imp");
        let federated = FederatedTableReference::new(&table, "events", 0);
        assert!(federated.owns_column(&ColumnReference::qualified("imp", "id")));
        assert!(federated.owns_column(&ColumnReference::qualified("impressions", "id")));
        assert!(federated.owns_column(&ColumnReference::qualified("events_aqfer.impressions", "id")));
        assert!(!federated.owns_column(&ColumnReference::qualified("c", "id")));
        assert!(!federated.owns_column(&ColumnReference::new("id")));
    }

    #[test]
    fn test_join_columns_either_order() {
        let federated =
            FederatedTableReference::new(&TableReference::new("ads_aqfer.clicks").with_alias("k"), "ads", 0);
        let dimension = TableReference::new("campaigns").with_alias("c");
        let written = col("c.id").eq(col("k.campaign_id")).into_inner();
        let (fed, dim) = join_columns(&written, &federated, &dimension).unwrap();
        assert_eq!(fed.column, "campaign_id");
        assert_eq!(dim.column, "id");

        let unrelated = col("c.id").eq(col("x.campaign_id")).into_inner();
        assert!(join_columns(&unrelated, &federated, &dimension).is_none());
    }

    #[test]
    fn test_dimension_join_columns_accepts_unqualified_side() {
        let federated =
            FederatedTableReference::new(&TableReference::new("ads_aqfer.clicks").with_alias("k"), "ads", 0);
        let dimension = TableReference::new("campaigns").with_alias("c");

        let written = col("id").eq(col("k.campaign_id")).into_inner();
        assert!(join_columns(&written, &federated, &dimension).is_none());
        let (fed, dim) = dimension_join_columns(&written, &federated, &dimension).unwrap();
        assert_eq!(fed.column, "campaign_id");
        assert_eq!(dim.column, "id");

        // Another table's column is not attributed to this dimension
        let other = col("k.campaign_id").eq(col("a.id")).into_inner();
        assert!(dimension_join_columns(&other, &federated, &dimension).is_none());
        let neither = col("id").eq(col("campaign_id")).into_inner();
        assert!(dimension_join_columns(&neither, &federated, &dimension).is_none());
    }

    #[test]
    fn test_strip_qualifiers() {
        let expr = func("LOWER", [col("imp.device")])
            .eq(lit("ios"))
            .and(col("imp.country").in_list([lit("US")]))
            .into_inner();
        assert_eq!(
            strip_qualifiers(&expr).to_string(),
            "LOWER(device) = 'ios' AND country IN ('US')"
        );
    }

    #[test]
    fn test_filter_condition_display() {
        let condition = FilterCondition {
            column: "status".to_string(),
            operator: BinaryOperator::Eq,
            value: Literal::string("active"),
        };
        assert_eq!(condition.to_string(), "status = 'active'");
    }
}
